//! Per-conversation transcripts and the `submit` entry point.

use crate::loop_runner::{SupportAgent, TurnOutcome};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use supportdesk_core::{ConversationId, DomainEvent, Result, Transcript};
use tokio::sync::{Mutex, RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Owns every live transcript and runs user turns against them.
///
/// A turn holds the lock on its own transcript only, so turns in different
/// conversations run concurrently while turns in one conversation are
/// strictly sequential. Transcripts live until the process exits.
pub struct ConversationManager {
    agent: SupportAgent,
    conversations: RwLock<HashMap<ConversationId, Arc<Conversation>>>,
}

/// The working transcript plus the state as of the last finished turn.
/// Readers see `committed` and never wait on a running turn.
struct Conversation {
    working: Mutex<Transcript>,
    committed: watch::Sender<Transcript>,
}

impl Conversation {
    fn new(id: ConversationId) -> Self {
        let transcript = Transcript::new(id);
        Self {
            committed: watch::Sender::new(transcript.clone()),
            working: Mutex::new(transcript),
        }
    }
}

impl ConversationManager {
    pub fn new(agent: SupportAgent) -> Self {
        Self {
            agent,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn agent(&self) -> &SupportAgent {
        &self.agent
    }

    /// Run one user turn and return the assistant's answer.
    pub async fn submit(&self, conversation_id: &ConversationId, user_text: &str) -> Result<String> {
        self.submit_turn(conversation_id, user_text, &CancellationToken::new())
            .await
            .map(|outcome| outcome.answer)
    }

    /// Run one user turn, stopping the in-flight model call if `cancel` fires.
    pub async fn submit_turn(
        &self,
        conversation_id: &ConversationId,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let conversation = self.conversation(conversation_id).await;
        let mut transcript = conversation.working.lock().await;

        let result = self.agent.run_turn(&mut transcript, user_text, cancel).await;
        conversation.committed.send_replace(transcript.clone());

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let retryable = e.is_retryable();
                error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    retryable,
                    "User turn failed"
                );
                self.agent.event_bus().publish(DomainEvent::TurnFailed {
                    conversation_id: conversation_id.to_string(),
                    error_message: e.to_string(),
                    retryable,
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// The transcript as of the last finished turn. A turn still in flight
    /// is not visible.
    pub async fn transcript(&self, conversation_id: &ConversationId) -> Option<Transcript> {
        let conversations = self.conversations.read().await;
        let conversation = conversations.get(conversation_id)?;
        let snapshot = conversation.committed.borrow().clone();
        Some(snapshot)
    }

    pub async fn conversation_ids(&self) -> Vec<ConversationId> {
        self.conversations.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    async fn conversation(&self, conversation_id: &ConversationId) -> Arc<Conversation> {
        if let Some(conversation) = self.conversations.read().await.get(conversation_id) {
            return conversation.clone();
        }

        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation_id.clone())
            .or_insert_with(|| {
                debug!(conversation_id = %conversation_id, "Starting conversation");
                Arc::new(Conversation::new(conversation_id.clone()))
            })
            .clone()
    }
}
