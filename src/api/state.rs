//! Application state shared across handlers.

use std::sync::Arc;

use crate::agent::AgentService;
use crate::chain::RpcClient;
use crate::chat::ChatService;
use crate::entitlement::EntitlementTracker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entitlement tracker gating chat usage.
    pub tracker: Arc<EntitlementTracker>,
    /// Agent directory service.
    pub agents: Arc<AgentService>,
    /// Chat orchestration service.
    pub chat: Arc<ChatService>,
    /// Chain RPC client for balance reads.
    pub rpc: Arc<RpcClient>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        tracker: EntitlementTracker,
        agents: AgentService,
        chat: ChatService,
        rpc: Arc<RpcClient>,
    ) -> Self {
        Self {
            tracker: Arc::new(tracker),
            agents: Arc::new(agents),
            chat: Arc::new(chat),
            rpc,
        }
    }
}
