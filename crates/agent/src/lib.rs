//! The ReAct agent loop for SupportDesk.
//!
//! Each user turn follows a **Reason → Act → Observe** cycle:
//!
//! 1. **Append** the user's text to the conversation transcript
//! 2. **Ask the model** with the system instruction, transcript and tool catalogue
//! 3. **If tool requests**: execute them in order, append one result each, go to 2
//! 4. **If a plain answer**: append it and return it to the caller
//!
//! The loop is capped at a configurable number of model calls per turn; when
//! the cap is hit the conversation is escalated to a human instead.

pub mod conversation;
pub mod loop_runner;
pub mod prompts;

#[cfg(test)]
mod test_helpers;

pub use conversation::ConversationManager;
pub use loop_runner::{
    ESCALATION_FALLBACK, INTERRUPTED_RESULT, ROUND_TRIP_ESCALATION_REASON, SupportAgent, TurnOutcome,
};
pub use prompts::SYSTEM_PROMPT;
pub use tokio_util::sync::CancellationToken;
