//! Error types for opwright-tools

use thiserror::Error;

/// Collaborator error type
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A named process is already registered under this name
    #[error("process '{0}' is already running")]
    AlreadyRunning(String),

    /// No named process is registered under this name
    #[error("no process named '{0}' is running")]
    NotRunning(String),

    /// Execution of an external program failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Path or argument rejected by a safety check
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Remote API returned an error response
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body or message
        message: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
