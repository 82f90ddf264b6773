//! Model backends for the support agent.
//!
//! Every backend speaks the OpenAI chat-completions dialect, so a single
//! [`OpenAiCompatProvider`] covers hosted and local servers alike.
//! [`build_from_config`] registers one per configured provider name.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
