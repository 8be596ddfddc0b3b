//! Error types for the multicast coordination system
//!
//! The taxonomy is deliberately narrow: nothing the engine encounters at
//! runtime is fatal. Malformed record payloads and missing local addresses
//! are skips (logged at debug level), not errors.

use thiserror::Error;

/// Result type alias for coordination operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the multicast coordination system
#[derive(Error, Debug)]
pub enum Error {
    /// Replicated state store errors
    #[error("state store error: {0}")]
    StateStore(String),

    /// Notification handler errors
    #[error("notifier error: {0}")]
    Notifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors (handler spawn, monitor sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a notifier error
    pub fn notifier(msg: impl Into<String>) -> Self {
        Self::Notifier(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
