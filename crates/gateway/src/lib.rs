//! HTTP API gateway for SupportDesk.
//!
//! Exposes a health check and the v1 chat API over a shared
//! [`ConversationManager`]. Built on Axum.

pub mod api_v1;

use axum::extract::{DefaultBodyLimit, State};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use supportdesk_agent::ConversationManager;
use supportdesk_config::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub manager: Arc<ConversationManager>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl GatewayState {
    pub fn new(manager: Arc<ConversationManager>) -> Self {
        Self {
            manager,
            start_time: chrono::Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router: `/health` plus the v1 API nested under `/v1`.
///
/// Layers: 64 KB body limit, permissive CORS, HTTP trace logging.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server on the configured host and port.
pub async fn start(
    config: &AppConfig,
    manager: Arc<ConversationManager>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(Arc::new(GatewayState::new(manager)));

    info!(addr = %addr, model = %config.default_model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
    conversations: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
        conversations: state.manager.len().await,
    })
}
