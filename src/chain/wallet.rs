//! Wallet signing seam.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;

use super::error::ChainResult;
use super::rpc::RpcClient;

/// Signing capability of a connected wallet.
///
/// The tracker only needs three things from a wallet: its address, the chain
/// it is on, and the ability to submit a native transfer. Tests substitute a
/// mock; production wires an RPC-managed account.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the connected wallet, if any.
    fn address(&self) -> Option<String>;

    /// Chain id the wallet is currently on.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Submit a native-currency transfer and return the transaction hash.
    async fn send_native_transfer(&self, to: &str, value_wei: U256) -> ChainResult<String>;
}

/// Placeholder signer for deployments with no payment wallet configured.
///
/// Every payment attempt fails with a wallet-unavailable error upstream
/// because `address` returns `None`.
pub struct NoWallet;

#[async_trait]
impl WalletSigner for NoWallet {
    fn address(&self) -> Option<String> {
        None
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Err(super::error::ChainError::ConnectionFailed {
            url: String::new(),
            message: "no payment wallet configured".to_string(),
        })
    }

    async fn send_native_transfer(&self, _to: &str, _value_wei: U256) -> ChainResult<String> {
        Err(super::error::ChainError::ConnectionFailed {
            url: String::new(),
            message: "no payment wallet configured".to_string(),
        })
    }
}

/// Wallet backed by a node-managed account on the RPC endpoint.
pub struct RpcWallet {
    rpc: Arc<RpcClient>,
    /// Unlocked account address on the node.
    account: String,
}

impl RpcWallet {
    /// Create a wallet for a node-managed account.
    pub fn new(rpc: Arc<RpcClient>, account: impl Into<String>) -> Self {
        Self {
            rpc,
            account: account.into(),
        }
    }
}

#[async_trait]
impl WalletSigner for RpcWallet {
    fn address(&self) -> Option<String> {
        Some(self.account.clone())
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        self.rpc.chain_id().await
    }

    async fn send_native_transfer(&self, to: &str, value_wei: U256) -> ChainResult<String> {
        self.rpc.send_transaction(&self.account, to, value_wei).await
    }
}
