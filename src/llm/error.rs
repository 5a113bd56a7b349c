//! Chat-completion client error types.

use thiserror::Error;

/// Result type for completion operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during completion calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("completion API key not configured")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("completion API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The API answered but produced no content.
    #[error("completion returned no content")]
    Empty,
}
