//! Repository abstraction for the TokenD client
//!
//! Repositories own an in-memory cache of server resources and refresh it on
//! demand:
//!
//! - `SimpleMultipleItemsRepository`: a list fetched in one go
//! - `PagedDataRepository`: a list fetched page by page with an opaque cursor
//! - `SimpleSingleItemRepository`: one item, optionally persisted
//!
//! Every repository runs at most one fetch at a time; concurrent `update`
//! calls join the fetch already in flight. Current items, the loading flag and
//! errors are published on separate channels.

pub mod cache;
pub mod error;
mod in_flight;
pub mod multiple;
pub mod pages;
pub mod paged;
pub mod single;
pub mod streams;

pub use cache::{Freshness, ItemsCache, SingleItemCache};
pub use error::RepositoryError;
pub use multiple::{MultipleItemsLoader, SimpleMultipleItemsRepository};
pub use pages::load_all_pages;
pub use paged::{PageLoader, PagedDataRepository};
pub use single::{ItemPersistence, SimpleSingleItemRepository, SingleItemLoader};
pub use streams::RepositoryStreams;
