//! Turn and Transcript domain types.
//!
//! These are the value objects that flow through the whole system:
//! caller submits text → agent appends a user turn → model answers or asks for tools
//! → tool results are appended → model answers.

use crate::error::TranscriptError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Unique within one assistant turn (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to invoke
    pub tool_name: String,

    /// Loosely-typed arguments as emitted by the model
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolRequest {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// What the model produced in one inference step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    /// Free text (may be empty when only tools are requested)
    #[serde(default)]
    pub text: String,

    /// Tool requests, in the order the model emitted them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,
}

impl AssistantTurn {
    /// A terminal answer with no tool requests.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_requests: Vec::new(),
        }
    }

    /// An answer is terminal for the current user turn.
    pub fn is_terminal(&self) -> bool {
        self.tool_requests.is_empty()
    }

    /// Give every request a distinct, non-empty id. Blank ids and repeats of
    /// an id already used in this turn are replaced with generated ones.
    /// Returns how many ids were replaced.
    pub fn normalize_request_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut replaced = 0;
        for (position, request) in self.tool_requests.iter_mut().enumerate() {
            if request.id.trim().is_empty() || seen.contains(&request.id) {
                request.id = format!("call_{position}_{}", Uuid::new_v4().simple());
                replaced += 1;
            }
            seen.insert(request.id.clone());
        }
        replaced
    }
}

/// A single entry in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    Assistant(AssistantTurn),
    ToolResult { tool_request_id: String, text: String },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User { text: text.into() }
    }

    pub fn tool_result(tool_request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Turn::ToolResult {
            tool_request_id: tool_request_id.into(),
            text: text.into(),
        }
    }
}

/// Ordered, append-only turn history for one conversation.
///
/// Every assistant turn that requests tools must be followed by exactly one
/// tool result per request, in request order, before anything else is appended.
/// The append methods reject any sequence that would break that pairing.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    id: ConversationId,
    turns: Vec<Turn>,
    #[serde(skip)]
    pending: VecDeque<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transcript {
    pub fn new(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            id,
            turns: Vec::new(),
            pending: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Ids of tool requests still waiting for a result, oldest first.
    pub fn pending_requests(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        self.ensure_resolved()?;
        self.append(Turn::user(text));
        Ok(())
    }

    pub fn push_assistant(&mut self, turn: AssistantTurn) -> Result<(), TranscriptError> {
        self.ensure_resolved()?;

        let mut seen = HashSet::new();
        for req in &turn.tool_requests {
            if !seen.insert(req.id.as_str()) {
                return Err(TranscriptError::DuplicateRequestId(req.id.clone()));
            }
        }

        self.pending
            .extend(turn.tool_requests.iter().map(|r| r.id.clone()));
        self.append(Turn::Assistant(turn));
        Ok(())
    }

    pub fn push_tool_result(
        &mut self,
        tool_request_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        let tool_request_id = tool_request_id.into();
        match self.pending.front() {
            None => return Err(TranscriptError::OrphanToolResult(tool_request_id)),
            Some(expected) if *expected != tool_request_id => {
                return Err(TranscriptError::UnexpectedToolResult {
                    expected: expected.clone(),
                    got: tool_request_id,
                });
            }
            Some(_) => {}
        }
        self.pending.pop_front();
        self.append(Turn::tool_result(tool_request_id, text));
        Ok(())
    }

    /// The most recent assistant answer with no tool requests, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::Assistant(a) if a.is_terminal() => Some(a.text.as_str()),
            _ => None,
        })
    }

    fn ensure_resolved(&self) -> Result<(), TranscriptError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TranscriptError::UnresolvedToolRequests {
                pending: self.pending.len(),
            })
        }
    }

    fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }
}
