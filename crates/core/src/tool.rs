//! Tool execution seam between the agent loop and the tool catalogue.
//!
//! The agent loop only sees wire-level [`ToolRequest`]s coming out of the model.
//! An executor turns each one into result text, or into a [`ToolError`] that the
//! loop decides how to surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::message::ToolRequest;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The request id this result answers
    pub request_id: String,

    /// Name of the tool that produced it
    pub tool_name: String,

    /// Human-readable text handed back to the model
    pub text: String,
}

/// The catalogue of tools available to the agent.
///
/// Implementations must be safe to share across concurrently running
/// conversations.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool definitions (for sending to the LLM), in declared order.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute a single tool request.
    async fn execute(&self, request: &ToolRequest) -> std::result::Result<ToolOutput, ToolError>;

    /// Whether a tool with this name exists.
    fn contains(&self, name: &str) -> bool {
        self.definitions().iter().any(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple executor for unit tests.
    struct EchoExecutor;

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition {
                name: "echo".into(),
                description: "Echoes back the input".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }]
        }

        async fn execute(&self, request: &ToolRequest) -> std::result::Result<ToolOutput, ToolError> {
            if request.tool_name != "echo" {
                return Err(ToolError::NotFound(request.tool_name.clone()));
            }
            let text = request
                .arguments
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            Ok(ToolOutput {
                request_id: request.id.clone(),
                tool_name: request.tool_name.clone(),
                text,
            })
        }
    }

    #[test]
    fn contains_uses_definitions() {
        assert!(EchoExecutor.contains("echo"));
        assert!(!EchoExecutor.contains("nonexistent"));
    }

    #[tokio::test]
    async fn execute_tool() {
        let mut args = serde_json::Map::new();
        args.insert("text".into(), "hello world".into());
        let out = EchoExecutor
            .execute(&ToolRequest::new("call_1", "echo", args))
            .await
            .unwrap();
        assert_eq!(out.request_id, "call_1");
        assert_eq!(out.text, "hello world");
    }

    #[tokio::test]
    async fn execute_missing_tool() {
        let err = EchoExecutor
            .execute(&ToolRequest::new("call_1", "nonexistent", serde_json::Map::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
