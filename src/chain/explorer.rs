//! Explorer transaction history client.
//!
//! Queries an Etherscan-compatible account endpoint for the full transaction
//! list of an address. Reconciliation filters the result for exact-amount
//! transfers to the service wallet.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::error::{ChainError, ChainResult};

/// One transaction row from the explorer.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRecord {
    /// Transaction hash.
    pub hash: String,
    /// Sender address.
    #[serde(default)]
    pub from: String,
    /// Recipient address; absent for contract creations.
    #[serde(default)]
    pub to: Option<String>,
    /// Transferred value in wei, as a decimal string.
    #[serde(default)]
    pub value: String,
    /// "0" when the transaction succeeded.
    #[serde(rename = "isError", default)]
    pub is_error: String,
}

impl TransferRecord {
    /// Whether the transfer executed without error.
    pub fn succeeded(&self) -> bool {
        self.is_error == "0" || self.is_error.is_empty()
    }
}

/// Envelope of the explorer account API.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Source of transaction history for an address.
///
/// Abstracted so reconciliation is testable without a live explorer.
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// List transactions originating from or arriving at `address`.
    async fn transfers_for(&self, address: &str) -> ChainResult<Vec<TransferRecord>>;
}

/// Client for an Etherscan-compatible explorer API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    client: Client,
    /// Query endpoint (e.g., "https://shannon-explorer.somnia.network/api").
    base_url: String,
}

impl ExplorerClient {
    /// Create a new explorer client.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TransferSource for ExplorerClient {
    async fn transfers_for(&self, address: &str) -> ChainResult<Vec<TransferRecord>> {
        let url = format!(
            "{}?module=account&action=txlist&address={}&sort=desc",
            self.base_url, address
        );

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| ChainError::ConnectionFailed {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(ChainError::Explorer(format!(
                "explorer returned HTTP {}",
                response.status()
            )));
        }

        let envelope: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Parse(format!("decoding explorer response: {e}")))?;

        // Status "0" with "No transactions found" is a valid empty result;
        // anything else non-"1" is an upstream failure.
        if envelope.status != "1" {
            let message = envelope.message.unwrap_or_default();
            if message.eq_ignore_ascii_case("no transactions found") {
                return Ok(Vec::new());
            }
            return Err(ChainError::Explorer(format!(
                "explorer status {}: {}",
                envelope.status, message
            )));
        }

        let result = envelope.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result)
            .map_err(|e| ChainError::Parse(format!("decoding transaction list: {e}")))
    }
}
