//! Test utilities and common setup.

use alloy_primitives::U256;
use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use agora::agent::{AgentRepository, AgentService};
use agora::api::{AppState, create_router};
use agora::chain::{
    ChainError, ChainParams, ChainResult, RpcClient, TransferRecord, TransferSource, WalletSigner,
};
use agora::chat::ChatService;
use agora::db::Database;
use agora::entitlement::EntitlementTracker;
use agora::llm::{CompletionBackend, CompletionRequest, LlmResult};
use agora::storage::MemoryStore;

/// Wallet used by the stub signer.
pub const WALLET: &str = "0x1111111111111111111111111111111111111111";

/// Completion backend replaying canned replies, then a fixed default.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    pub fn with(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl CompletionBackend for ScriptedLlm {
    async fn complete(&self, _request: CompletionRequest) -> LlmResult<String> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "stub reply".to_string()))
    }
}

/// Wallet stub connected on a configurable chain.
pub struct StubWallet {
    chain_id: u64,
    sent: AtomicU64,
}

impl StubWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id,
            sent: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl WalletSigner for StubWallet {
    fn address(&self) -> Option<String> {
        Some(WALLET.to_string())
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(self.chain_id)
    }

    async fn send_native_transfer(&self, _to: &str, _value_wei: U256) -> ChainResult<String> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0xtest-tx-{n}"))
    }
}

/// Transfer source stub with a fixed transaction list.
pub struct StubTransfers {
    records: Vec<TransferRecord>,
    fail: bool,
}

impl StubTransfers {
    pub fn with(records: Vec<TransferRecord>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl TransferSource for StubTransfers {
    async fn transfers_for(&self, _address: &str) -> ChainResult<Vec<TransferRecord>> {
        if self.fail {
            return Err(ChainError::Explorer("explorer down".to_string()));
        }
        Ok(self.records.clone())
    }
}

/// A successful exact-price payment to the default recipient.
pub fn payment_tx(hash: &str) -> TransferRecord {
    TransferRecord {
        hash: hash.to_string(),
        from: WALLET.to_string(),
        to: Some(ChainParams::default().recipient),
        value: "100000000000000000".to_string(),
        is_error: "0".to_string(),
    }
}

/// Create a test application with stub collaborators.
pub async fn test_app_with(
    llm: Arc<ScriptedLlm>,
    wallet: StubWallet,
    transfers: StubTransfers,
) -> Router {
    let db = Database::in_memory().await.unwrap();

    let params = ChainParams::default();
    let tracker = EntitlementTracker::new(
        Arc::new(MemoryStore::new()),
        Arc::new(wallet),
        Arc::new(transfers),
        params,
    );

    let agent_repo = AgentRepository::new(db.pool().clone());
    let agents = AgentService::new(agent_repo.clone(), llm.clone());
    let chat = ChatService::new(agent_repo, llm);

    // Unreachable endpoint: balance reads surface as service-unavailable.
    let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1"));

    let state = AppState::new(tracker, agents, chat, rpc);
    create_router(state)
}

/// Default test application: connected wallet on the right chain, no on-chain
/// history, completion backend answering "stub reply".
pub async fn test_app() -> Router {
    test_app_with(
        ScriptedLlm::with(&[]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await
}
