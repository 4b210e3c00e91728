pub mod asset;
pub mod asset_pair;
pub mod balance;
pub mod company;
pub mod error;
pub mod kyc;
pub mod mapping;
pub mod page;
pub mod resources;
pub mod sale;
pub mod swap;
pub mod system;
pub mod url_config;

pub use asset::*;
pub use asset_pair::*;
pub use balance::*;
pub use company::*;
pub use error::*;
pub use kyc::*;
pub use mapping::*;
pub use page::*;
pub use resources::*;
pub use sale::*;
pub use swap::*;
pub use system::*;
pub use url_config::*;
