//! Error types for the CCV consumer store

use thiserror::Error;

/// Main error type for the CCV consumer store
#[derive(Error, Debug)]
pub enum CcvError {
    // ============ Key Space Errors ============
    #[error("Malformed {field} key: {reason}")]
    MalformedKey { field: &'static str, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ============ Storage Errors ============
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Value corruption detected: {0}")]
    ValueCorruption(String),

    // ============ Serialization Errors ============
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CcvError {
    /// Shorthand for a malformed key error
    pub fn malformed_key(field: &'static str, reason: impl Into<String>) -> Self {
        CcvError::MalformedKey {
            field,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for CcvError {
    fn from(err: std::io::Error) -> Self {
        CcvError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for CcvError {
    fn from(err: serde_json::Error) -> Self {
        CcvError::SerializationError(err.to_string())
    }
}
