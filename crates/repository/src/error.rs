use thiserror::Error;
use tokend_types::MappingError;

/// Errors surfaced by repository fetches.
///
/// `Clone` because one fetch result is handed to every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No wallet, account, session or API instance to fetch with
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("inconsistent data: {0}")]
    InconsistentData(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("fetch task aborted: {0}")]
    FetchAborted(String),
}

impl RepositoryError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingPrecondition(what.into())
    }
}
