pub mod api;
pub mod error;
pub mod mock;
pub mod provider;
pub mod providers;
pub mod repositories;
pub mod sign_in;
pub mod signing;
pub mod storage;
pub mod swaps;
pub mod use_cases;

pub use api::*;
pub use error::*;
pub use provider::*;
pub use providers::*;
pub use repositories::*;
pub use sign_in::*;
pub use signing::*;
pub use storage::*;
pub use use_cases::*;

// Swap reconciliation exports
pub use swaps::{SwapLeg, SwapsLoader, SwapsRepository};
