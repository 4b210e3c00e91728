use thiserror::Error;

/// Failure to turn a wire resource into a domain record.
///
/// Payloads are plain strings so the error stays `Clone` and can travel
/// through shared fetch results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("unsupported conversion: {0}")]
    Unsupported(String),

    #[error("json error: {0}")]
    Json(String),
}

impl MappingError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
