//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_origins(state, &[])
}

/// Create the application router with explicit CORS origins.
pub fn create_router_with_origins(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = build_cors_layer(allowed_origins);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        // Chat
        .route("/chat", post(handlers::chat))
        .route("/chat/assistant", post(handlers::assistant_chat))
        // Agent directory
        .route(
            "/agents",
            get(handlers::list_agents).post(handlers::register_agent),
        )
        .route("/agents/validate", post(handlers::validate_agent))
        .route("/agents/generate", post(handlers::generate_agent_info))
        // GET resolves by slug; DELETE addresses the agent by id.
        .route(
            "/agents/{agent}",
            get(handlers::get_agent).delete(handlers::delete_agent),
        )
        // Wallet entitlements
        .route(
            "/wallets/{address}/entitlement",
            get(handlers::get_entitlement),
        )
        .route("/wallets/{address}/payments", post(handlers::process_payment))
        .route("/wallets/{address}/verify", post(handlers::verify_payments))
        .route("/wallets/{address}/balance", get(handlers::get_balance))
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}

/// Build the CORS layer.
///
/// With no configured origins the API is treated as public and any origin is
/// allowed; configured origins restrict it.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN];

    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::error!("CORS: all configured origins are invalid");
        CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    }
}
