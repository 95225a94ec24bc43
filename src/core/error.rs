//! Error types for worker thread management
//!
//! Pool operations never produce these errors; their outcomes travel in
//! sentinel return values ([`Fetched`](crate::queue::Fetched),
//! [`Rejected`](crate::queue::Rejected)). `WorkerError` covers the two
//! genuinely fallible OS interactions of a [`ThreadWorker`](crate::worker::ThreadWorker):
//! spawning and joining its background thread.

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur while managing a worker thread
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WorkerError {
    /// Failed to spawn the worker's background thread
    #[error("failed to spawn worker thread '{label}': {message}")]
    Spawn {
        /// Identifier of the worker
        label: String,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join the worker's background thread
    #[error("failed to join worker thread '{label}': {message}")]
    Join {
        /// Identifier of the worker
        label: String,
        /// Error message
        message: String,
    },
}

impl WorkerError {
    /// Create a spawn error
    pub fn spawn(label: impl Into<String>, message: impl Into<String>) -> Self {
        WorkerError::Spawn {
            label: label.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with the underlying IO error
    pub fn spawn_with_source(label: impl Into<String>, source: std::io::Error) -> Self {
        WorkerError::Spawn {
            label: label.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(label: impl Into<String>, message: impl Into<String>) -> Self {
        WorkerError::Join {
            label: label.into(),
            message: message.into(),
        }
    }
}
