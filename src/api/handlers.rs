//! API request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{Agent, GenerateInfoRequest, RegisterAgentRequest, ValidationVerdict};
use crate::chain::{format_native, normalize_address};
use crate::chat::{AssistantReply, ChatTurn};
use crate::entitlement::{VerificationRecord, WalletPhase};
use crate::llm::ChatMessage;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Request body for an entitlement-gated chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Wallet paying for the turn.
    pub wallet: String,
    pub message: String,
    #[serde(default)]
    pub agent_slug: Option<String>,
    #[serde(default)]
    pub context: Vec<ChatMessage>,
}

/// Response body for a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Messages left after this turn was debited.
    pub messages_remaining: u64,
}

/// Entitlement-gated chat with an agent.
///
/// The balance is debited only after the completion succeeded; a failed
/// completion is never charged.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let wallet = normalize_address(&request.wallet);
    if wallet.is_empty() {
        return Err(ApiError::bad_request("wallet is required"));
    }

    if state.tracker.needs_payment(&wallet).await? {
        return Err(ApiError::payment_required(format!(
            "no messages remaining, send {} {} to continue",
            state.tracker.params().price_per_bundle,
            state.tracker.params().token_symbol
        )));
    }

    let response = state
        .chat
        .send(ChatTurn {
            message: request.message,
            agent_slug: request.agent_slug,
            context: request.context,
        })
        .await?;

    let balance = state.tracker.decrement_message_count(&wallet).await?;

    Ok(Json(ChatResponse {
        response,
        messages_remaining: balance.messages_remaining,
    }))
}

/// Request body for the marketplace assistant.
#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

/// Marketplace assistant chat; free of entitlement gating.
pub async fn assistant_chat(
    State(state): State<AppState>,
    Json(request): Json<AssistantRequest>,
) -> ApiResult<Json<AssistantReply>> {
    let reply = state.chat.assistant_query(&request.message).await?;
    Ok(Json(reply))
}

/// Listing filter parameters.
#[derive(Debug, Deserialize)]
pub struct ListAgentsQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

/// List agents, optionally filtered by category or creator wallet.
pub async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<ListAgentsQuery>,
) -> ApiResult<Json<Vec<Agent>>> {
    let agents = match (query.category, query.creator) {
        (Some(category), _) => state.agents.list_by_category(&category).await?,
        (None, Some(creator)) => state.agents.list_by_creator(&creator).await?,
        (None, None) => state.agents.list().await?,
    };
    Ok(Json(agents))
}

/// Get an agent by slug.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Agent>> {
    Ok(Json(state.agents.get_by_slug(&slug).await?))
}

/// Register a new agent.
pub async fn register_agent(
    State(state): State<AppState>,
    Json(request): Json<RegisterAgentRequest>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    let agent = state.agents.register(request).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// Request body for agent deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteAgentRequest {
    pub creator_wallet: String,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteAgentResponse {
    pub success: bool,
    pub message: String,
}

/// Delete an agent; only its creator may do so.
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<DeleteAgentRequest>,
) -> ApiResult<Json<DeleteAgentResponse>> {
    if request.creator_wallet.trim().is_empty() {
        return Err(ApiError::bad_request("creator wallet is required"));
    }

    state
        .agents
        .delete(&agent_id, &request.creator_wallet)
        .await?;

    Ok(Json(DeleteAgentResponse {
        success: true,
        message: "Agent deleted successfully".to_string(),
    }))
}

/// Request body for submission moderation.
#[derive(Debug, Deserialize)]
pub struct ValidateAgentRequest {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Moderate a submission without registering it.
pub async fn validate_agent(
    State(state): State<AppState>,
    Json(request): Json<ValidateAgentRequest>,
) -> ApiResult<Json<ValidationVerdict>> {
    let verdict = state
        .agents
        .validate(&request.name, &request.description, &request.category)
        .await?;
    Ok(Json(verdict))
}

/// Generated listing field response.
#[derive(Debug, Serialize)]
pub struct GenerateInfoResponse {
    pub success: bool,
    pub generated_text: String,
    pub field: String,
}

/// Generate an agent name or description from partial context.
pub async fn generate_agent_info(
    State(state): State<AppState>,
    Json(request): Json<GenerateInfoRequest>,
) -> ApiResult<Json<GenerateInfoResponse>> {
    let generated = state.agents.generate_info(request).await?;
    Ok(Json(GenerateInfoResponse {
        success: true,
        generated_text: generated.generated_text,
        field: generated.field.to_string(),
    }))
}

/// Entitlement snapshot for a wallet.
#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub address: String,
    pub messages_remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_hash: Option<String>,
    pub needs_payment: bool,
    pub phase: WalletPhase,
}

/// Current balance of a wallet.
pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<EntitlementResponse>> {
    let address = normalize_address(&address);
    let balance = state.tracker.entitlement(&address).await?;

    Ok(Json(EntitlementResponse {
        needs_payment: balance.needs_payment(),
        messages_remaining: balance.messages_remaining,
        last_payment_hash: balance.last_payment_hash,
        phase: state.tracker.phase(&address),
        address,
    }))
}

/// Payment result.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub tx_hash: String,
    pub messages_remaining: u64,
}

/// Submit a bundle payment through the configured wallet.
pub async fn process_payment(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<PaymentResponse>> {
    let address = normalize_address(&address);
    match state.tracker.connected_address() {
        Some(connected) if connected == address => {}
        Some(connected) => {
            return Err(ApiError::bad_request(format!(
                "connected wallet {connected} does not match {address}"
            )));
        }
        None => {}
    }

    let tx_hash = state.tracker.process_payment().await?;
    let balance = state.tracker.entitlement(&address).await?;

    info!("payment {} credited for {}", tx_hash, address);
    Ok(Json(PaymentResponse {
        tx_hash,
        messages_remaining: balance.messages_remaining,
    }))
}

/// Request body for a reconciliation pass.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    /// External usage estimate; the stored counter is used when absent.
    #[serde(default)]
    pub messages_used: Option<u64>,
}

/// Reconcile a wallet's balance against observed on-chain transfers.
pub async fn verify_payments(
    State(state): State<AppState>,
    Path(address): Path<String>,
    body: Option<Json<VerifyRequest>>,
) -> ApiResult<Json<VerificationRecord>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let record = match request.messages_used {
        Some(used) => state.tracker.verify_wallet_payments(&address, used).await?,
        None => state.tracker.connect(&address).await?,
    };

    Ok(Json(record))
}

/// Native balance of a wallet.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    /// Balance in wei, as a decimal string.
    pub balance_wei: String,
    /// Balance in native units.
    pub balance: String,
}

/// Read the native balance of a wallet from the chain.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    let address = normalize_address(&address);
    let wei = state.rpc.get_balance(&address).await?;

    Ok(Json(BalanceResponse {
        balance_wei: wei.to_string(),
        balance: format_native(wei),
        address,
    }))
}
