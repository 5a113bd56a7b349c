//! Chain access layer.
//!
//! Provides the fixed chain parameters, wei arithmetic helpers, a minimal
//! JSON-RPC client for balance reads and native transfers, an explorer-style
//! transaction history client, and the wallet signing seam.

mod error;
mod explorer;
mod rpc;
mod wallet;

pub use error::{ChainError, ChainResult};
pub use explorer::{ExplorerClient, TransferRecord, TransferSource};
pub use rpc::RpcClient;
pub use wallet::{NoWallet, RpcWallet, WalletSigner};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Number of decimals of the native token.
pub const NATIVE_DECIMALS: u32 = 18;

/// Fixed chain parameters for payment processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainParams {
    /// Expected chain id; payments on any other network are rejected.
    pub network_id: u64,
    /// Service wallet receiving bundle payments.
    pub recipient: String,
    /// Price of one message bundle as a decimal string of native units.
    pub price_per_bundle: String,
    /// Messages granted per bundle payment.
    pub messages_per_bundle: u32,
    /// Native token symbol, for display and error messages.
    pub token_symbol: String,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Explorer query endpoint (Etherscan-compatible).
    pub explorer_url: String,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            network_id: 50312,
            recipient: "0xE867be6751b23Bd389792AC080F604C4608a8637".to_string(),
            price_per_bundle: "0.1".to_string(),
            messages_per_bundle: 30,
            token_symbol: "STT".to_string(),
            rpc_url: "https://dream-rpc.somnia.network".to_string(),
            explorer_url: "https://shannon-explorer.somnia.network/api".to_string(),
        }
    }
}

impl ChainParams {
    /// Bundle price converted to wei.
    pub fn bundle_price_wei(&self) -> ChainResult<U256> {
        parse_native(&self.price_per_bundle)
    }
}

/// Lowercase a wallet address for comparison and storage keys.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Parse a decimal native-unit amount ("0.1") into wei.
pub fn parse_native(amount: &str) -> ChainResult<U256> {
    let trimmed = amount.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(ChainError::InvalidAmount(amount.to_string()));
    }
    if frac.len() > NATIVE_DECIMALS as usize {
        return Err(ChainError::InvalidAmount(amount.to_string()));
    }

    let whole_part = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)
            .map_err(|_| ChainError::InvalidAmount(amount.to_string()))?
    };

    let mut padded = frac.to_string();
    while padded.len() < NATIVE_DECIMALS as usize {
        padded.push('0');
    }
    let frac_part = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10)
            .map_err(|_| ChainError::InvalidAmount(amount.to_string()))?
    };

    let scale = U256::from(10u64).pow(U256::from(NATIVE_DECIMALS));
    Ok(whole_part * scale + frac_part)
}

/// Format a wei amount as a decimal native-unit string.
pub fn format_native(wei: U256) -> String {
    let scale = U256::from(10u64).pow(U256::from(NATIVE_DECIMALS));
    let whole = wei / scale;
    let remainder = wei % scale;
    if remainder.is_zero() {
        return whole.to_string();
    }

    let mut frac = format!("{:018}", remainder);
    while frac.ends_with('0') {
        frac.pop();
    }
    format!("{whole}.{frac}")
}

/// Parse a JSON-RPC hex quantity ("0xde0b6b3a7640000") into a U256.
pub fn parse_hex_quantity(raw: &str) -> ChainResult<U256> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::Parse(format!("expected hex quantity, got {trimmed:?}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChainError::Parse(format!("invalid hex quantity {trimmed:?}: {e}")))
}
