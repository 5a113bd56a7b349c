//! Minimal JSON-RPC client for balance reads and native transfers.

use alloy_primitives::U256;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::error::{ChainError, ChainResult};
use super::parse_hex_quantity;

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorBody>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Client for a JSON-RPC chain endpoint.
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    /// Endpoint URL (e.g., "https://dream-rpc.somnia.network").
    url: String,
    /// Monotonic request id.
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client.
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue a raw JSON-RPC call and return the `result` field.
    async fn call(&self, method: &str, params: serde_json::Value) -> ChainResult<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Parse(format!("decoding {method} response: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| ChainError::Parse(format!("{method} response missing result")))
    }

    /// Fetch the chain id reported by the node.
    pub async fn chain_id(&self) -> ChainResult<u64> {
        let result = self.call("eth_chainId", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::Parse("eth_chainId result is not a string".to_string()))?;
        let id = parse_hex_quantity(raw)?;
        u64::try_from(id).map_err(|_| ChainError::Parse(format!("chain id out of range: {raw}")))
    }

    /// Fetch the native balance of an address in wei.
    pub async fn get_balance(&self, address: &str) -> ChainResult<U256> {
        let result = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        let raw = result.as_str().ok_or_else(|| {
            ChainError::Parse("eth_getBalance result is not a string".to_string())
        })?;
        parse_hex_quantity(raw)
    }

    /// Submit a native-currency transfer from a node-managed account.
    ///
    /// Returns the transaction hash on acceptance.
    pub async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        value_wei: U256,
    ) -> ChainResult<String> {
        let params = json!([{
            "from": from,
            "to": to,
            "value": format!("0x{:x}", value_wei),
        }]);

        let result = self.call("eth_sendTransaction", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::Parse("eth_sendTransaction result is not a string".to_string()))
    }
}
