//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST /v1/chat`: Submit a user turn, get the answer
//! - `GET  /v1/conversations`: List live conversation ids
//! - `GET  /v1/conversations/{id}`: Get a conversation's transcript
//! - `GET  /v1/tools`: List the tool catalogue

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use supportdesk_agent::CancellationToken;
use supportdesk_core::{ConversationId, Error, ProviderError, Transcript};
use tracing::info;

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/conversations", get(list_conversations_handler))
        .route("/conversations/{id}", get(get_conversation_handler))
        .route("/tools", get(list_tools_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new conversation
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub answer: String,
    pub model_calls: usize,
    pub tool_calls: usize,
    pub escalated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// A failed request, rendered as `{error, retryable}`.
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                retryable: false,
            },
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: message.into(),
                retryable: false,
            },
        }
    }
}

/// Upstream failures map to 502, timeouts to 504, everything else to 500.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Timeout { .. } | Error::Provider(ProviderError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        e if e.is_retryable() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self {
            status: status_for(&err),
            body: ErrorResponse {
                retryable: err.is_retryable(),
                error: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let conversation_id = match payload.conversation_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => ConversationId::from(id),
        _ => ConversationId::new(),
    };
    info!(conversation_id = %conversation_id, "v1/chat request");

    let outcome = state
        .manager
        .submit_turn(&conversation_id, &payload.message, &CancellationToken::new())
        .await?;

    Ok(Json(ChatResponse {
        conversation_id: conversation_id.to_string(),
        answer: outcome.answer,
        model_calls: outcome.model_calls,
        tool_calls: outcome.tool_calls,
        escalated: outcome.escalated,
    }))
}

async fn list_conversations_handler(State(state): State<SharedState>) -> Json<ConversationListResponse> {
    let mut conversations: Vec<String> = state
        .manager
        .conversation_ids()
        .await
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    conversations.sort();
    Json(ConversationListResponse { conversations })
}

async fn get_conversation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Transcript>, ApiError> {
    state
        .manager
        .transcript(&ConversationId::from(&id))
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("conversation '{id}' not found")))
}

async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let defs = state.manager.agent().tools().definitions();
    let count = defs.len();

    Json(ToolListResponse {
        tools: defs
            .into_iter()
            .map(|d| ToolDto {
                name: d.name,
                description: d.description,
                parameters: d.parameters,
            })
            .collect(),
        count,
    })
}
