use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure raised while processing a single library event
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Payload (or key) could not be decoded into a library event
    #[error("{0}")]
    Format(String),

    /// Well-formed event that breaks a domain rule
    #[error("{0}")]
    Validation(String),

    /// Transient condition, worth retrying later
    #[error("{0}")]
    Recoverable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        ProcessingError::Format(format!("Malformed library event: {}", err))
    }
}

impl ProcessingError {
    /// Stable name used in logs, metrics and the `dlt-exception-kind` header
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::Format(_) => "FormatError",
            ProcessingError::Validation(_) => "ValidationError",
            ProcessingError::Recoverable(_) => "RecoverableError",
            ProcessingError::Database(_) => "DatabaseError",
        }
    }

    /// Whether another attempt could change the outcome.
    ///
    /// Format and validation failures are deterministic and skip the backoff loop.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ProcessingError::Format(_) | ProcessingError::Validation(_)
        )
    }

    /// Transient failures that should be re-driven through the retry topic
    pub fn is_transient(&self) -> bool {
        match self {
            ProcessingError::Recoverable(_) => true,
            ProcessingError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

/// Failure to hand a record to the broker
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Kafka publish failed: {0}")]
    Kafka(String),

    #[error("Kafka publish timed out")]
    Timeout,
}

/// Service-level errors (startup, configuration, broker plumbing)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
