//! # SupportDesk Core
//!
//! Domain types, traits, and error definitions for the SupportDesk ReAct agent.
//! This crate has no framework dependencies; it defines the model every
//! other crate implements against.
//!
//! ## Layout
//!
//! - [`message`]: turns, tool requests and the append-only [`Transcript`]
//! - [`provider`]: the [`Provider`] seam to language-model backends
//! - [`tool`]: the [`ToolExecutor`] seam to the tool catalogue
//! - [`event`]: broadcast [`EventBus`] for domain events
//! - [`error`]: one error enum per bounded context

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, KnowledgeError, ProviderError, Result, ToolError, TranscriptError};
pub use event::{DomainEvent, EventBus};
pub use message::{AssistantTurn, ConversationId, ToolRequest, Transcript, Turn};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    ToolDefinition, Usage,
};
pub use tool::{ToolExecutor, ToolOutput};
