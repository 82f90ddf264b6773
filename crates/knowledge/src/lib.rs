//! Semantic knowledge base for SupportDesk.
//!
//! Renders a JSON knowledge source into categorised passages, embeds them
//! once at startup, and answers cosine-similarity queries.

pub mod category;
pub mod document;
pub mod embedding;
pub mod index;
pub mod vector;

pub use category::{Category, DocType};
pub use document::{KnowledgeDocument, KnowledgeSource, load_source, parse_source};
pub use embedding::{Embedder, HashingEmbedder, ProviderEmbedder};
pub use index::{NO_RESULTS, ScoredDocument, VectorIndex};
pub use vector::cosine_similarity;
