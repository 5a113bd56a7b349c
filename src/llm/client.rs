//! Chat-completion HTTP client.

use reqwest::Client;
use std::time::Duration;

use super::error::{LlmError, LlmResult};
use super::types::*;

/// Default completion model.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Client for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct LlmClient {
    /// HTTP client.
    client: Client,
    /// Base URL (e.g., "https://api.aimlapi.com/v1").
    base_url: String,
    /// Bearer API key.
    api_key: String,
    /// Model identifier.
    model: String,
}

impl LlmClient {
    /// Create a new completion client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Run a completion and return the first choice's content.
    pub async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("decoding completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new("https://api.aimlapi.com/v1", "test-key");
        assert_eq!(client.base_url, "https://api.aimlapi.com/v1");
        assert_eq!(client.model, "gpt-4o");
    }

    #[test]
    fn test_with_model() {
        let client = LlmClient::new("https://api.aimlapi.com/v1", "k").with_model("gpt-4o-mini");
        assert_eq!(client.model, "gpt-4o-mini");
    }
}
