//! Chat-completion client module.
//!
//! Provides an async client for an OpenAI-compatible chat-completion API,
//! debited one entitlement message per accepted call.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::LlmClient;
pub use error::{LlmError, LlmResult};
pub use types::*;

/// Minimal completion API abstraction for testability.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String>;
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        self.complete(request).await
    }
}
