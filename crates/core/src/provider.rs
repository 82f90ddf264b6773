//! The seam between the agent loop and a language model.
//!
//! A [`Provider`] takes the system instruction, the transcript so far and the
//! tool catalogue, and answers with the next assistant turn. Embeddings ride
//! on the same trait so the knowledge index can reuse a configured backend.

use crate::error::ProviderError;
use crate::message::{AssistantTurn, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// One model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// e.g. `llama3.1:latest`, `gpt-4o-mini`
    pub model: String,

    /// Sent ahead of the transcript on every call
    pub system: String,

    pub turns: Vec<Turn>,

    /// Zero keeps tool selection deterministic
    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// What the model sees of a tool: its name, a description and a JSON Schema
/// for the arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub turn: AssistantTurn,

    pub usage: Option<Usage>,

    /// The model that actually answered, which some routers substitute
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub inputs: Vec<String>,
}

/// `embeddings[i]` belongs to `inputs[i]` of the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name, e.g. `ollama`.
    fn name(&self) -> &str;

    async fn complete(&self, request: ProviderRequest) -> ProviderResult<ProviderResponse>;

    /// Backends without an embeddings endpoint report `NotConfigured`.
    async fn embed(&self, _request: EmbeddingRequest) -> ProviderResult<EmbeddingResponse> {
        Err(ProviderError::NotConfigured(format!(
            "{} has no embeddings endpoint",
            self.name()
        )))
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> ProviderResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AnswerOnly;

    #[async_trait]
    impl Provider for AnswerOnly {
        fn name(&self) -> &str {
            "answer-only"
        }

        async fn complete(&self, _request: ProviderRequest) -> ProviderResult<ProviderResponse> {
            Ok(ProviderResponse {
                turn: AssistantTurn::answer("ok"),
                usage: None,
                model: "m".into(),
            })
        }
    }

    #[test]
    fn omitted_temperature_and_tools_take_defaults() {
        let req: ProviderRequest = serde_json::from_value(serde_json::json!({
            "model": "llama3.1:latest",
            "system": "be helpful",
            "turns": []
        }))
        .unwrap();
        assert_eq!(req.temperature, 0.0);
        assert!(req.tools.is_empty());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn empty_tool_list_is_not_serialized() {
        let req = ProviderRequest {
            model: "m".into(),
            system: String::new(),
            turns: vec![Turn::user("hi")],
            temperature: 0.0,
            max_tokens: None,
            tools: Vec::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn embeddings_are_opt_in() {
        let provider = AnswerOnly;
        let err = provider
            .embed(EmbeddingRequest { model: "x".into(), inputs: vec!["a".into()] })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ref m) if m.contains("answer-only")));
        assert!(provider.health_check().await.unwrap());
        assert!(provider.list_models().await.unwrap().is_empty());
    }
}
