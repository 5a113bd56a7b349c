//! API integration tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{ScriptedLlm, StubTransfers, StubWallet, WALLET, payment_tx, test_app, test_app_with};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder
                .body(Body::from(serde_json::to_string(&value).unwrap()))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Approving moderation verdict for seeding agents.
const APPROVE: &str = r#"{"approved": true, "reason": "Looks legitimate"}"#;

fn registration_body() -> Value {
    json!({
        "name": "Flow Analyzer",
        "description": "Summarizes on-chain token flow for a wallet",
        "category": "Analysis",
        "price_per_query": 0.01,
        "payment_wallet": "0x2222222222222222222222222222222222222222",
        "creator_wallet": WALLET,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let response = send(&app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_chat_requires_payment() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "wallet": WALLET, "message": "hello there agent" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PAYMENT_REQUIRED");
}

#[tokio::test]
async fn test_payment_then_chat_debits_balance() {
    let app = test_app().await;

    // Pay for a bundle.
    let response = send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/payments"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payment = body_json(response).await;
    assert_eq!(payment["messages_remaining"], 30);
    assert!(payment["tx_hash"].as_str().unwrap().starts_with("0x"));

    // Balance is visible and sufficient.
    let response = send(
        &app,
        Method::GET,
        &format!("/wallets/{WALLET}/entitlement"),
        None,
    )
    .await;
    let entitlement = body_json(response).await;
    assert_eq!(entitlement["messages_remaining"], 30);
    assert_eq!(entitlement["needs_payment"], false);

    // One chat turn consumes one message.
    let response = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "wallet": WALLET, "message": "summarize the market" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let chat = body_json(response).await;
    assert_eq!(chat["response"], "stub reply");
    assert_eq!(chat["messages_remaining"], 29);
}

#[tokio::test]
async fn test_chat_rejects_invalid_query_without_charging() {
    let app = test_app().await;

    send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/payments"),
        None,
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "wallet": WALLET, "message": "hi" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Failed turns are not charged.
    let response = send(
        &app,
        Method::GET,
        &format!("/wallets/{WALLET}/entitlement"),
        None,
    )
    .await;
    assert_eq!(body_json(response).await["messages_remaining"], 30);
}

#[tokio::test]
async fn test_chat_with_unknown_agent() {
    let app = test_app().await;

    send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/payments"),
        None,
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({
            "wallet": WALLET,
            "message": "hello there agent",
            "agent_slug": "missing",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_network_payment_rejected() {
    let app = test_app_with(
        ScriptedLlm::with(&[]),
        StubWallet::on_chain(1),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/payments"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("50312"));
    assert!(message.contains("1"));

    // Balance unchanged.
    let response = send(
        &app,
        Method::GET,
        &format!("/wallets/{WALLET}/entitlement"),
        None,
    )
    .await;
    assert_eq!(body_json(response).await["messages_remaining"], 0);
}

#[tokio::test]
async fn test_register_and_list_agents() {
    let app = test_app_with(
        ScriptedLlm::with(&[APPROVE]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(&app, Method::POST, "/agents", Some(registration_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let agent = body_json(response).await;
    assert_eq!(agent["slug"], "flow-analyzer");
    assert_eq!(agent["status"], "active");

    let response = send(&app, Method::GET, "/agents", None).await;
    let listing = body_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let response = send(&app, Method::GET, "/agents/flow-analyzer", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Flow Analyzer");

    let response = send(&app, Method::GET, "/agents?category=Trading", None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_denied_by_moderation() {
    let app = test_app_with(
        ScriptedLlm::with(&[r#"{"approved": false, "reason": "Misleading claims"}"#]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(&app, Method::POST, "/agents", Some(registration_body())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Misleading claims"));
}

#[tokio::test]
async fn test_delete_agent_authorization() {
    let app = test_app_with(
        ScriptedLlm::with(&[APPROVE]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(&app, Method::POST, "/agents", Some(registration_body())).await;
    let agent_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Missing creator wallet -> 400.
    let response = send(
        &app,
        Method::DELETE,
        &format!("/agents/{agent_id}"),
        Some(json!({ "creator_wallet": "" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Someone else's wallet -> 403.
    let response = send(
        &app,
        Method::DELETE,
        &format!("/agents/{agent_id}"),
        Some(json!({ "creator_wallet": "0x9999999999999999999999999999999999999999" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown agent -> 404.
    let response = send(
        &app,
        Method::DELETE,
        "/agents/nope",
        Some(json!({ "creator_wallet": WALLET })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Creator (case-insensitive) -> success.
    let response = send(
        &app,
        Method::DELETE,
        &format!("/agents/{agent_id}"),
        Some(json!({ "creator_wallet": WALLET.to_uppercase().replace("0X", "0x") })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = send(&app, Method::GET, "/agents", None).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_endpoint_reports_verdict() {
    let app = test_app_with(
        ScriptedLlm::with(&[r#"{"approved": false, "reason": "Spam"}"#]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        "/agents/validate",
        Some(json!({
            "name": "Buy now",
            "description": "buy buy buy",
            "category": "Trading",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["approved"], false);
    assert_eq!(json["reason"], "Spam");
}

#[tokio::test]
async fn test_generate_endpoint_cleans_reply() {
    let app = test_app_with(
        ScriptedLlm::with(&["\"Ledger Lens\""]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        "/agents/generate",
        Some(json!({
            "categories": ["Analysis"],
            "generate_field": "name",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["generated_text"], "Ledger Lens");
    assert_eq!(json["field"], "name");
}

#[tokio::test]
async fn test_verify_reconciles_on_chain_history() {
    let app = test_app_with(
        ScriptedLlm::with(&[]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![payment_tx("0xaaa"), payment_tx("0xbbb")]),
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/verify"),
        Some(json!({ "messages_used": 40 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let record = body_json(response).await;
    assert_eq!(record["total_payments"], 2);
    assert_eq!(record["total_messages_purchased"], 60);
    assert_eq!(record["messages_remaining"], 20);

    // Entitlement now reflects the reconciled balance.
    let response = send(
        &app,
        Method::GET,
        &format!("/wallets/{WALLET}/entitlement"),
        None,
    )
    .await;
    let entitlement = body_json(response).await;
    assert_eq!(entitlement["messages_remaining"], 20);
    assert_eq!(entitlement["phase"], "verified");
}

#[tokio::test]
async fn test_verify_with_unavailable_source_degrades() {
    let app = test_app_with(
        ScriptedLlm::with(&[]),
        StubWallet::on_chain(50312),
        StubTransfers::unavailable(),
    )
    .await;

    let response = send(
        &app,
        Method::POST,
        &format!("/wallets/{WALLET}/verify"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let record = body_json(response).await;
    assert_eq!(record["total_payments"], 0);
    assert_eq!(record["messages_remaining"], 0);
    assert!(record["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_assistant_chat_attaches_directory() {
    let app = test_app_with(
        ScriptedLlm::with(&[APPROVE, "We have one analysis agent."]),
        StubWallet::on_chain(50312),
        StubTransfers::with(vec![]),
    )
    .await;

    send(&app, Method::POST, "/agents", Some(registration_body())).await;

    let response = send(
        &app,
        Method::POST,
        "/chat/assistant",
        Some(json!({ "message": "what agents are available?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["response"], "We have one analysis agent.");
    assert_eq!(json["agents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_balance_endpoint_degrades_when_rpc_unreachable() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::GET,
        &format!("/wallets/{WALLET}/balance"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_entitlement_defaults_for_unknown_wallet() {
    let app = test_app().await;

    let response = send(
        &app,
        Method::GET,
        "/wallets/0x9999999999999999999999999999999999999999/entitlement",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["messages_remaining"], 0);
    assert_eq!(json["needs_payment"], true);
    assert_eq!(json["phase"], "disconnected");
}
