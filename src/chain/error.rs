//! Chain client error types.

use thiserror::Error;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur talking to the chain or explorer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Could not reach the endpoint.
    #[error("failed to connect to {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// JSON-RPC node returned an error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Explorer returned a non-success payload.
    #[error("explorer error: {0}")]
    Explorer(String),

    /// Response could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// A native-unit amount string could not be converted to wei.
    #[error("invalid native amount: {0}")]
    InvalidAmount(String),
}
