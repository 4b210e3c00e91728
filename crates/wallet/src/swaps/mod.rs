//! Atomic swaps across backing systems

pub mod classify;
mod repository;

pub use classify::{build_record, classify, group_by_hash, Classification, Perspective, SwapLeg};
pub use repository::{SwapsLoader, SwapsRepository};
