use thiserror::Error;

/// Errors that can occur while running a query against a backend.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A session could not be established (bad host, auth failure, unreachable network).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The statement was rejected or failed while fetching rows.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The backend's driver is not present in this build or runtime.
    #[error("{0}")]
    Unavailable(String),

    /// The blocking driver task panicked or was cancelled.
    #[error("Driver task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for ExecutorError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExecutorError::Join(err.to_string())
    }
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecutorError>;
