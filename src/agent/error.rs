//! Agent directory error types.

use thiserror::Error;

use crate::llm::LlmError;

/// Result type for directory operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur managing agent listings.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Submission failed a required field check.
    #[error("invalid submission: {0}")]
    Invalid(String),

    /// Content moderation denied the submission.
    #[error("submission rejected: {reason}")]
    ValidationRejected { reason: String },

    /// An agent with this slug already exists.
    #[error("agent name already taken: {0}")]
    SlugTaken(String),

    /// No such agent.
    #[error("agent not found: {0}")]
    NotFound(String),

    /// Requesting wallet is not the creator.
    #[error("unauthorized: only the creator can delete an agent")]
    Unauthorized,

    /// Moderation or generation backend failed.
    #[error("completion backend error: {0}")]
    Backend(#[from] LlmError),

    /// Database failure.
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}
