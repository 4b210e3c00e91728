use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to everything and the
/// `tokend*` crates log at `trace` when `level` is `debug` or `trace`.
pub fn init_tracing(level: &str, json: bool) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))
        .map_err(|e| TracingError::InvalidFilter(e.to_string()))?;

    let fmt_layer = if json {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
            .boxed()
    } else {
        fmt::layer().with_target(true).with_level(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

fn default_directives(level: &str) -> String {
    let level = level.to_lowercase();
    match level.as_str() {
        "trace" | "debug" => format!("{level},tokend=trace"),
        _ => level,
    }
}

/// Correlation ID tying together the log lines of one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one repository fetch
#[derive(Debug, Clone)]
pub struct FetchSpan {
    pub correlation_id: CorrelationId,
    pub repository: &'static str,
    pub operation: &'static str,
}

impl FetchSpan {
    pub fn new(repository: &'static str, operation: &'static str) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            repository,
            operation,
        }
    }

    /// Span to attach to the fetch future with `Instrument::instrument`
    pub fn span(&self) -> ::tracing::Span {
        ::tracing::info_span!(
            "fetch",
            correlation_id = %self.correlation_id,
            repository = self.repository,
            operation = self.operation,
        )
    }
}

/// Error enrichment for adding context to errors
pub trait ErrorContext {
    /// Log the error against the repository it came from
    fn with_repository(self, repository: &str) -> Self;

    /// Log the error against a named one-shot operation
    fn with_operation(self, operation: &str) -> Self;
}

impl<T, E> ErrorContext for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_repository(self, repository: &str) -> Self {
        self.map_err(|e| {
            ::tracing::error!(repository = %repository, error = %e, "repository fetch failed");
            e
        })
    }

    fn with_operation(self, operation: &str) -> Self {
        self.map_err(|e| {
            ::tracing::error!(operation = %operation, error = %e, "operation failed");
            e
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}
