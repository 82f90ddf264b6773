//! Error types for the SupportDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all SupportDesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Knowledge base errors ---
    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Transcript errors ---
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Turn lifecycle ---
    #[error("Model call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Turn cancelled by caller")]
    Cancelled,

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller may reasonably resubmit the same user turn.
    ///
    /// External service failures (model endpoint, embedding backend, timeouts)
    /// are retryable. Programming and configuration errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Provider(e) => e.is_retryable(),
            Error::Knowledge(KnowledgeError::Embedding(_)) => true,
            Error::Tool(ToolError::Unavailable { .. }) => true,
            Error::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_)
            | ProviderError::Network(_) => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Failed to load knowledge source {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// A backing service the tool depends on is down. Fatal for the turn.
    #[error("Tool backend unavailable: {tool_name}: {reason}")]
    Unavailable { tool_name: String, reason: String },
}

impl ToolError {
    /// Errors the model caused and can recover from by seeing them in the transcript.
    pub fn is_model_recoverable(&self) -> bool {
        matches!(
            self,
            ToolError::NotFound(_) | ToolError::InvalidArguments { .. } | ToolError::ExecutionFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("Tool result for '{got}' does not answer pending request '{expected}'")]
    UnexpectedToolResult { expected: String, got: String },

    #[error("Tool result for '{0}' has no pending tool request")]
    OrphanToolResult(String),

    #[error("{pending} tool request(s) still awaiting results")]
    UnresolvedToolRequests { pending: usize },

    #[error("Duplicate tool request id '{0}' in one assistant turn")]
    DuplicateRequestId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::InvalidArguments {
            tool_name: "get_order_status".into(),
            reason: "missing field `order_id`".into(),
        });
        assert!(err.to_string().contains("get_order_status"));
        assert!(err.to_string().contains("order_id"));
    }

    #[test]
    fn retryable_classification() {
        assert!(Error::Provider(ProviderError::Network("reset".into())).is_retryable());
        assert!(Error::Timeout { timeout_secs: 60 }.is_retryable());
        assert!(Error::Knowledge(KnowledgeError::Embedding("down".into())).is_retryable());
        assert!(!Error::Provider(ProviderError::AuthenticationFailed("bad key".into())).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(
            Error::Provider(ProviderError::ApiError { status_code: 503, message: "busy".into() })
                .is_retryable()
        );
    }

    #[test]
    fn unavailable_tool_is_not_model_recoverable() {
        let err = ToolError::Unavailable { tool_name: "search".into(), reason: "down".into() };
        assert!(!err.is_model_recoverable());
        assert!(ToolError::NotFound("cancel_order".into()).is_model_recoverable());
    }
}
