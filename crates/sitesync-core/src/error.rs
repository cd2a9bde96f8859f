//! Error types for the site synchronizer
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for synchronizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the site synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Provider returned a non-200 response; carries the raw HTTP status
    /// and the provider's message verbatim
    #[error("provider API error (status {status}): {message}")]
    Api {
        /// Raw HTTP status code
        status: u16,
        /// Provider-supplied message (or raw body)
        message: String,
    },

    /// Network failure, timeout, or malformed response body
    #[error("transport error: {0}")]
    Transport(String),

    /// The token is valid but does not cover the requested domain
    #[error("no matching zone for domain: {0}")]
    NoMatchingZone(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration store errors
    #[error("config store error: {0}")]
    Store(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider API error from a raw status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a config store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error indicates a corrupted on-disk store file
    ///
    /// Used by the file store to decide between backup recovery and
    /// propagating a real I/O failure.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Json(_))
    }

    /// Whether a bounded read retry may be attempted for this error
    ///
    /// Only transport failures and provider-side throttling/outages are
    /// retryable. `NoMatchingZone` is terminal for the current operation.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
