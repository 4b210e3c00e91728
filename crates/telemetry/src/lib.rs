//! Logging bootstrap and span helpers shared by the TokenD client crates
//!
//! - `init_tracing`: installs the global `tracing` subscriber
//! - `FetchSpan`: one span per repository fetch, tagged with a correlation id
//! - `ErrorContext`: logs an error with repository/operation context on its way out

mod tracing;

pub use crate::tracing::*;
