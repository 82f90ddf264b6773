//! Chat-completions client for any endpoint speaking the OpenAI wire format.
//!
//! Covers hosted services (OpenAI, OpenRouter, Groq) and local servers
//! (Ollama, vLLM, llama.cpp). Function calling, `/embeddings` and `/models`
//! are all routed through [`OpenAiCompatProvider::send`], which owns auth and
//! HTTP status translation.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use supportdesk_core::error::ProviderError;
use supportdesk_core::message::{AssistantTurn, ToolRequest, Turn};
use supportdesk_core::provider::*;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// `base_url` is the API root, e.g. `http://localhost:11434/v1`. An empty
    /// `api_key` sends no `Authorization` header.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        let base_url = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Attach credentials, dispatch, and turn every non-2xx reply into the
    /// matching [`ProviderError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let request = if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        warn!(provider = %self.name, status = status.as_u16(), body = %body, "Provider returned error");
        Err(map_status(status, retry_after, body))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ProviderError> {
        let response = self.send(self.client.post(self.endpoint(path)).json(body)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{path}: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

fn map_status(status: StatusCode, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationFailed(format!("{status}: check the configured API key"))
        }
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(body),
        other => ProviderError::ApiError {
            status_code: other.as_u16(),
            message: body,
        },
    }
}

/// Request body for `/chat/completions`.
fn chat_body(request: &ProviderRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": wire_transcript(&request.system, &request.turns),
        "temperature": request.temperature,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if !request.tools.is_empty() {
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from).collect();
        body["tools"] = json!(tools);
    }
    body
}

fn wire_transcript(system: &str, turns: &[Turn]) -> Vec<WireMessage> {
    let preamble = (!system.is_empty()).then(|| WireMessage::plain("system", system));
    preamble
        .into_iter()
        .chain(turns.iter().map(WireMessage::from))
        .collect()
}

impl WireMessage {
    fn plain(role: &str, content: &str) -> Self {
        Self {
            role: role.to_owned(),
            content: Some(content.to_owned()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        match turn {
            Turn::User { text } => Self::plain("user", text),
            Turn::ToolResult { tool_request_id, text } => Self {
                tool_call_id: Some(tool_request_id.clone()),
                ..Self::plain("tool", text)
            },
            Turn::Assistant(a) if a.tool_requests.is_empty() => Self::plain("assistant", &a.text),
            Turn::Assistant(a) => Self {
                role: "assistant".to_owned(),
                content: (!a.text.is_empty()).then(|| a.text.clone()),
                tool_calls: Some(a.tool_requests.iter().map(WireToolCall::from).collect()),
                tool_call_id: None,
            },
        }
    }
}

impl From<&ToolRequest> for WireToolCall {
    fn from(req: &ToolRequest) -> Self {
        let encoded = Value::Object(req.arguments.clone()).to_string();
        Self {
            id: req.id.clone(),
            kind: FUNCTION.to_owned(),
            function: WireFunctionCall {
                name: req.tool_name.clone(),
                arguments: Value::String(encoded),
            },
        }
    }
}

impl From<&ToolDefinition> for WireTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: FUNCTION.to_owned(),
            function: WireToolSpec {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

/// Build the assistant turn from the first choice. Missing or repeated
/// request ids are replaced so tool results can still be paired.
fn assistant_turn(message: WireMessage) -> AssistantTurn {
    let tool_requests = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let WireFunctionCall { name, arguments } = call.function;
            let arguments = decode_arguments(&name, arguments);
            ToolRequest::new(call.id, name, arguments)
        })
        .collect();

    let mut turn = AssistantTurn {
        text: message.content.unwrap_or_default(),
        tool_requests,
    };
    let replaced = turn.normalize_request_ids();
    if replaced > 0 {
        debug!(replaced, "Assigned fresh ids to tool calls");
    }
    turn
}

/// Tool arguments arrive as a JSON-encoded string (OpenAI) or as an inline
/// object (some local servers). Anything that is not an object decodes to an
/// empty map, and argument validation downstream reports what is missing.
fn decode_arguments(tool_name: &str, raw: Value) -> Map<String, Value> {
    let value = match raw {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!(tool = tool_name, error = %e, "Model emitted undecodable tool arguments");
            Value::Null
        }),
        other => other,
    };

    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            warn!(tool = tool_name, arguments = %other, "Tool arguments are not a JSON object");
            Map::new()
        }
    }
}

#[async_trait]
impl supportdesk_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        debug!(
            provider = %self.name,
            model = %request.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Requesting completion"
        );

        let completion: ChatCompletion = self.post("chat/completions", &chat_body(&request)).await?;
        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(ProviderError::InvalidResponse("completion carried no choices".into()));
        };

        Ok(ProviderResponse {
            turn: assistant_turn(choice.message),
            usage: completion.usage.map(TokenCounts::into_usage),
            model: completion.model.unwrap_or(request.model),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self.send(self.client.get(self.endpoint("models"))).await?;
        let listing: ModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("models: {e}")))?;
        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }

    /// Unreachable endpoints are errors; a reachable endpoint that refuses the
    /// request is merely unhealthy.
    async fn health_check(&self) -> Result<bool, ProviderError> {
        match self.send(self.client.get(self.endpoint("models"))).await {
            Ok(_) => Ok(true),
            Err(e @ (ProviderError::Network(_) | ProviderError::Timeout(_))) => Err(e),
            Err(e) => {
                debug!(provider = %self.name, error = %e, "Health check rejected");
                Ok(false)
            }
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        debug!(
            provider = %self.name,
            model = %request.model,
            inputs = request.inputs.len(),
            "Requesting embeddings"
        );

        let body = json!({
            "model": request.model,
            "input": request.inputs,
            "encoding_format": "float",
        });
        let mut list: EmbeddingList = self.post("embeddings", &body).await?;
        let model = list.model.take().unwrap_or(request.model);
        let usage = list.usage.take().map(TokenCounts::into_usage);

        Ok(EmbeddingResponse {
            embeddings: list.vectors_in_input_order(),
            model,
            usage,
        })
    }
}

// Wire types

const FUNCTION: &str = "function";

fn function_kind() -> String {
    FUNCTION.to_owned()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireToolSpec,
}

#[derive(Debug, Serialize)]
struct WireToolSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenCounts>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

/// Shared by completions and embeddings; the latter omit `completion_tokens`.
#[derive(Debug, Deserialize)]
struct TokenCounts {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl TokenCounts {
    fn into_usage(self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingList {
    data: Vec<EmbeddingRow>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<TokenCounts>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingList {
    /// Servers may answer out of order; `index` is authoritative.
    fn vectors_in_input_order(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|row| row.index);
        self.data.into_iter().map(|row| row.embedding).collect()
    }
}
