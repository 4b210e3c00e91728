use thiserror::Error;
use tokend_repository::RepositoryError;
use tokend_types::MappingError;

/// Errors returned by the remote API collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ApiError> for RepositoryError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::NotFound(what) => RepositoryError::NotFound(what),
            other => RepositoryError::Network(other.to_string()),
        }
    }
}

/// Why a group of swap legs could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("inconsistent state of swap {hash}: {reason}")]
    InconsistentSwapState { hash: String, reason: String },

    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl SwapError {
    pub fn inconsistent(hash: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InconsistentSwapState {
            hash: hash.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("invalid secret seed: {0}")]
    InvalidSeed(String),

    #[error("transaction encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignInError {
    #[error("key storage error: {0}")]
    KeyStorage(#[from] ApiError),

    #[error("account derivation failed: {0}")]
    Account(#[from] SigningError),

    #[error("account derivation task failed: {0}")]
    Task(String),
}

/// Errors of one-shot use cases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("invalid amount: {0}")]
    Amount(String),
}
