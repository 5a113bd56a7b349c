//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be decoded.
    #[error("corrupt value for key {key}: {message}")]
    Corrupt { key: String, message: String },

    /// Invalid key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Storage backend error.
    #[error("backend error: {0}")]
    Backend(String),
}
