//! Conversation lifecycle events.
//!
//! The agent loop and the tools publish onto an [`EventBus`]; anything that
//! wants to watch (audit logging, tests, a future dashboard) subscribes. A
//! bus with no subscribers silently drops events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The model produced an assistant turn
    ResponseGenerated {
        conversation_id: String,
        model: String,
        tokens_used: u32,
        tool_requests: usize,
        timestamp: DateTime<Utc>,
    },

    ToolExecuted {
        conversation_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A support ticket was raised for a human agent
    EscalationCreated {
        ticket_id: String,
        reason: String,
        message_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A user turn hit the model round-trip cap
    RoundTripLimitReached {
        conversation_id: String,
        round_trips: usize,
        timestamp: DateTime<Utc>,
    },

    /// A user turn failed and was reported back to the caller
    TurnFailed {
        conversation_id: String,
        error_message: String,
        retryable: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Short, stable name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResponseGenerated { .. } => "response_generated",
            Self::ToolExecuted { .. } => "tool_executed",
            Self::EscalationCreated { .. } => "escalation_created",
            Self::RoundTripLimitReached { .. } => "round_trip_limit_reached",
            Self::TurnFailed { .. } => "turn_failed",
        }
    }

    /// Escalations are raised by a tool and carry a ticket, not a conversation.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::ResponseGenerated { conversation_id, .. }
            | Self::ToolExecuted { conversation_id, .. }
            | Self::RoundTripLimitReached { conversation_id, .. }
            | Self::TurnFailed { conversation_id, .. } => Some(conversation_id),
            Self::EscalationCreated { .. } => None,
        }
    }
}

pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }

    /// Mirror every event into the tracing log until the bus is dropped.
    pub fn spawn_logger(&self) -> JoinHandle<()> {
        let mut events = self.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => tracing::debug!(
                        event = event.kind(),
                        conversation = event.conversation_id().unwrap_or("-"),
                        detail = %serde_json::to_string(event.as_ref()).unwrap_or_default(),
                        "Domain event"
                    ),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Event logger fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
