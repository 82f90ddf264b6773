//! The ReAct loop for a single user turn.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use supportdesk_config::AppConfig;
use supportdesk_core::{
    AssistantTurn, DomainEvent, Error, EventBus, Provider, ProviderRequest, ProviderResponse, Result,
    ToolDefinition, ToolExecutor, ToolRequest, Transcript,
};
use supportdesk_tools::ToolName;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::prompts::SYSTEM_PROMPT;

/// Reason attached to the escalation raised when the round-trip cap is hit.
pub const ROUND_TRIP_ESCALATION_REASON: &str =
    "complex_issue: automated assistant could not resolve the request";

/// Tool result recorded for a request whose turn was dropped before it ran.
pub const INTERRUPTED_RESULT: &str = "Error: interrupted before the tool finished";

/// Answer used when the cap is hit and the escalation itself fails.
pub const ESCALATION_FALLBACK: &str = "I'm sorry, I wasn't able to resolve this automatically. \
Please contact our support team at support@store.com or 1-800-SUPPORT and we'll be glad to help.";

/// What one user turn produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The terminal answer shown to the customer
    pub answer: String,

    /// Model invocations made during the turn
    pub model_calls: usize,

    /// Tool executions, including a cap-triggered escalation
    pub tool_calls: usize,

    /// A human escalation ticket was raised during the turn
    pub escalated: bool,

    /// The turn ended because it hit the round-trip cap
    pub hit_round_trip_limit: bool,
}

enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolRequest>),
    Done(String),
}

/// Drives a transcript through model calls and tool executions until the
/// model answers without requesting tools.
pub struct SupportAgent {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    tools: Arc<dyn ToolExecutor>,
    event_bus: Arc<EventBus>,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,

    /// Model invocations allowed per user turn
    max_round_trips: usize,

    model_timeout: Duration,
}

impl SupportAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<dyn ToolExecutor>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            event_bus,
            system_prompt: SYSTEM_PROMPT.to_string(),
            temperature: 0.0,
            max_tokens: None,
            max_round_trips: 8,
            model_timeout: Duration::from_secs(60),
        }
    }

    /// Build an agent with the model, sampling and loop settings from `config`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut agent = Self::new(provider, config.default_model.clone(), tools, event_bus)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_round_trips(config.agent.max_round_trips)
            .with_model_timeout(Duration::from_secs(config.agent.model_timeout_secs));
        if let Some(prompt) = &config.agent.system_prompt_override {
            agent = agent.with_system_prompt(prompt.clone());
        }
        agent
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the model round-trip cap. Values below 1 are raised to 1.
    pub fn with_max_round_trips(mut self, max: usize) -> Self {
        self.max_round_trips = max.max(1);
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn tools(&self) -> &Arc<dyn ToolExecutor> {
        &self.tools
    }

    /// Run one user turn to completion.
    ///
    /// Appends the user text, then alternates model calls and tool executions.
    /// Turns are only ever appended. On error the transcript is left with no
    /// unresolved tool requests, so the next turn can proceed. Requests left
    /// open by an earlier turn that was dropped mid-tool are resolved with
    /// [`INTERRUPTED_RESULT`] first.
    pub async fn run_turn(
        &self,
        transcript: &mut Transcript,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let conversation_id = transcript.id().to_string();
        info!(
            conversation_id = %conversation_id,
            turns = transcript.len(),
            "Processing user turn"
        );

        Self::resolve_interrupted(transcript)?;
        transcript.push_user(user_text)?;
        let definitions = self.tools.definitions();
        let mut outcome = TurnOutcome::default();
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if outcome.model_calls >= self.max_round_trips {
                        return self.escalate_after_cap(transcript, user_text, outcome).await;
                    }

                    debug!(
                        conversation_id = %conversation_id,
                        round_trip = outcome.model_calls + 1,
                        "Calling model"
                    );
                    let response = self.call_model(transcript, &definitions, cancel).await?;
                    outcome.model_calls += 1;

                    self.event_bus.publish(DomainEvent::ResponseGenerated {
                        conversation_id: conversation_id.clone(),
                        model: response.model.clone(),
                        tokens_used: response.usage.as_ref().map_or(0, |u| u.total_tokens),
                        tool_requests: response.turn.tool_requests.len(),
                        timestamp: Utc::now(),
                    });

                    let mut turn = response.turn;
                    let renamed = turn.normalize_request_ids();
                    if renamed > 0 {
                        warn!(conversation_id = %conversation_id, renamed, "Model reused tool request ids");
                    }
                    if turn.is_terminal() {
                        let answer = turn.text.clone();
                        transcript.push_assistant(turn)?;
                        LoopState::Done(answer)
                    } else {
                        let requests = turn.tool_requests.clone();
                        transcript.push_assistant(turn)?;
                        LoopState::ExecutingTools(requests)
                    }
                }
                LoopState::ExecutingTools(requests) => {
                    self.execute_tools(transcript, &requests, &mut outcome).await?;
                    LoopState::AwaitingModel
                }
                LoopState::Done(answer) => {
                    info!(
                        conversation_id = %conversation_id,
                        model_calls = outcome.model_calls,
                        tool_calls = outcome.tool_calls,
                        "User turn complete"
                    );
                    outcome.answer = answer;
                    return Ok(outcome);
                }
            };
        }
    }

    fn resolve_interrupted(transcript: &mut Transcript) -> Result<()> {
        let open: Vec<String> = transcript.pending_requests().map(str::to_owned).collect();
        if open.is_empty() {
            return Ok(());
        }
        warn!(
            conversation_id = %transcript.id(),
            pending = open.len(),
            "Resolving tool requests left open by an interrupted turn"
        );
        for id in open {
            transcript.push_tool_result(id, INTERRUPTED_RESULT)?;
        }
        Ok(())
    }

    async fn call_model(
        &self,
        transcript: &Transcript,
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<ProviderResponse> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            turns: transcript.turns().to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.model_timeout, self.provider.complete(request)) => {
                match result {
                    Ok(response) => Ok(response?),
                    Err(_) => Err(Error::Timeout {
                        timeout_secs: self.model_timeout.as_secs(),
                    }),
                }
            }
        }
    }

    /// Execute `requests` in order, appending one result per request.
    ///
    /// Errors the model can act on become `Error:` results. A backend outage
    /// resolves every remaining request with the same error text and fails
    /// the turn.
    async fn execute_tools(
        &self,
        transcript: &mut Transcript,
        requests: &[ToolRequest],
        outcome: &mut TurnOutcome,
    ) -> Result<()> {
        let conversation_id = transcript.id().to_string();

        for (position, request) in requests.iter().enumerate() {
            let start = Instant::now();
            let result = self.tools.execute(request).await;
            let duration_ms = start.elapsed().as_millis() as u64;
            outcome.tool_calls += 1;

            self.event_bus.publish(DomainEvent::ToolExecuted {
                conversation_id: conversation_id.clone(),
                tool_name: request.tool_name.clone(),
                success: result.is_ok(),
                duration_ms,
                timestamp: Utc::now(),
            });

            match result {
                Ok(output) => {
                    debug!(tool = %request.tool_name, duration_ms, "Tool succeeded");
                    if output.tool_name == ToolName::EscalateToHuman.as_str() {
                        outcome.escalated = true;
                    }
                    transcript.push_tool_result(&request.id, output.text)?;
                }
                Err(e) if e.is_model_recoverable() => {
                    warn!(tool = %request.tool_name, error = %e, "Tool call rejected");
                    transcript.push_tool_result(&request.id, format!("Error: {e}"))?;
                }
                Err(e) => {
                    error!(tool = %request.tool_name, error = %e, "Tool backend unavailable");
                    for pending in &requests[position..] {
                        transcript.push_tool_result(&pending.id, format!("Error: {e}"))?;
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    async fn escalate_after_cap(
        &self,
        transcript: &mut Transcript,
        user_text: &str,
        mut outcome: TurnOutcome,
    ) -> Result<TurnOutcome> {
        let conversation_id = transcript.id().to_string();
        warn!(
            conversation_id = %conversation_id,
            round_trips = outcome.model_calls,
            "Round-trip limit reached, escalating to a human"
        );
        self.event_bus.publish(DomainEvent::RoundTripLimitReached {
            conversation_id,
            round_trips: outcome.model_calls,
            timestamp: Utc::now(),
        });

        let mut arguments = Map::new();
        arguments.insert("reason".into(), Value::String(ROUND_TRIP_ESCALATION_REASON.into()));
        arguments.insert("customer_message".into(), Value::String(user_text.into()));
        let request = ToolRequest::new(
            format!("call_escalate_{}", Uuid::new_v4().simple()),
            ToolName::EscalateToHuman.as_str(),
            arguments,
        );

        transcript.push_assistant(AssistantTurn {
            text: String::new(),
            tool_requests: vec![request.clone()],
        })?;

        outcome.tool_calls += 1;
        let answer = match self.tools.execute(&request).await {
            Ok(output) => {
                outcome.escalated = true;
                transcript.push_tool_result(&request.id, output.text.clone())?;
                output.text
            }
            Err(e) => {
                error!(error = %e, "Automatic escalation failed");
                transcript.push_tool_result(&request.id, format!("Error: {e}"))?;
                ESCALATION_FALLBACK.to_string()
            }
        };

        transcript.push_assistant(AssistantTurn::answer(answer.clone()))?;
        outcome.answer = answer;
        outcome.hit_round_trip_limit = true;
        Ok(outcome)
    }
}
