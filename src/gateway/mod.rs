//! HTTP gateway: the inbound message endpoint and a health probe.
//!
//! The `/honeypot/message` route requires the pre-shared `x-api-key` header;
//! everything behind it is the core engine. CORS is left permissive: scam
//! platforms relay from arbitrary origins and the header check is the only
//! gate that matters.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};
use tracing::info;

use crate::agent::{DecoyAgent, InboundMessage};
use crate::intel::Intelligence;

const API_KEY_HEADER: &str = "x-api-key";
const MAX_BODY_BYTES: usize = 64 * 1024;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all gateway handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<DecoyAgent>,
    pub api_key: String,
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub session_id: String,
    pub message: MessagePayload,
    /// Accepted for wire compatibility; the engine keeps its own history.
    #[serde(default)]
    pub conversation_history: Vec<serde_json::Value>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub status: String,
    pub reply: String,
    pub scam_detected: bool,
    pub intelligence: Intelligence,
}

// ── Auth ────────────────────────────────────────────────────────

/// Verify the pre-shared key header. Returns an error response if it is
/// missing or wrong; the core is never invoked in that case.
fn require_api_key(
    state: &AppState,
    headers: &HeaderMap,
) -> std::result::Result<(), (StatusCode, Json<serde_json::Value>)> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !state.api_key.is_empty() && presented == state.api_key {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid or missing API key"})),
        ))
    }
}

// ── Handlers ────────────────────────────────────────────────────

/// POST /honeypot/message — run one turn through the engine.
pub async fn handle_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MessageRequest>,
) -> impl IntoResponse {
    if let Err(e) = require_api_key(&state, &headers) {
        return e.into_response();
    }

    let inbound = InboundMessage {
        sender: body.message.sender,
        text: body.message.text,
        timestamp: body.message.timestamp,
    };

    match state.agent.handle_message(&body.session_id, &inbound).await {
        Ok(outcome) => Json(MessageResponse {
            status: "success".to_string(),
            reply: outcome.reply,
            scam_detected: outcome.scam_detected,
            intelligence: outcome.intelligence,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to process message: {e}")})),
        )
            .into_response(),
    }
}

/// GET / — liveness probe, unauthenticated.
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "msg": "tarpit decoy agent is active",
        "activeSessions": state.agent.session_count(),
    }))
}

// ── Server ──────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/honeypot/message", post(handle_message))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run_gateway(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind gateway on {addr}"))?;
    let local_addr = listener.local_addr()?;
    info!("gateway listening on {local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received; draining gateway");
        })
        .await
        .context("gateway server exited")?;
    Ok(())
}
