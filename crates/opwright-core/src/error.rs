//! Error types for opwright-core

use crate::status::{InteractionStatus, StatusEvent};
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (unreadable or invalid settings, unknown key)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Collaborator error
    #[error("tool error: {0}")]
    Tool(#[from] opwright_tools::Error),

    /// A batch is already being applied on this workspace
    #[error("another batch is still being applied")]
    Busy,

    /// Status event not allowed in the current state
    #[error("invalid status transition: {event} while {from}")]
    InvalidTransition {
        /// State the machine was in
        from: InteractionStatus,
        /// Rejected event
        event: StatusEvent,
    },

    /// The response stream failed before completing
    #[error("stream error: {0}")]
    Stream(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
