//! Error types for offload
//!
//! All crates in the workspace share this error type.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// offload error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Boundary
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // Task execution
    // ========================================================================
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Executor error: {executor} - {message}")]
    Executor { executor: String, message: String },

    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors a host caller can act on (bad argument, unknown id, elapsed wait)
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Timeout(_)
        )
    }

    /// Not-found error for a task id
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("task {} not found", id))
    }

    /// Executor error helper
    pub fn executor(executor: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Executor {
            executor: executor.into(),
            message: message.into(),
        }
    }
}
