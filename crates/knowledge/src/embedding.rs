//! Embedding functions for passages and queries.
//!
//! Two implementations:
//! - [`HashingEmbedder`]: signed feature hashing over word tokens. Offline and
//!   deterministic, so the same text always yields the same vector.
//! - [`ProviderEmbedder`]: delegates to a provider's embeddings endpoint.

use async_trait::async_trait;
use std::sync::Arc;
use supportdesk_core::{EmbeddingRequest, KnowledgeError, Provider};
use tracing::debug;

/// Converts text into fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError>;
}

// ── Hashing embedder ────────────────────────────────────────────────────

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "s", "the", "to", "what", "when",
    "where", "which", "with", "you", "your",
];

pub const DEFAULT_DIMENSIONS: usize = 384;

/// Token-hash embedding: every word is hashed with FNV-1a into one of `dims`
/// buckets with a hash-derived sign, and the result is L2-normalised.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn dimensions(&self) -> usize {
        self.dims
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in tokenize(text) {
            let h = fnv1a64(&token);
            let idx = (h % self.dims as u64) as usize;
            let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        normalize(&mut v);
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Lowercased alphanumeric words, minus stopwords, with a plural `s` folded.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| {
            if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
                w[..w.len() - 1].to_string()
            } else {
                w
            }
        })
}

fn fnv1a64(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |h, b| (h ^ b as u64).wrapping_mul(PRIME))
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── Provider embedder ───────────────────────────────────────────────────

/// Embeds through [`Provider::embed`], e.g. Ollama's `nomic-embed-text`.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = self.provider.name(), model = %self.model, count = texts.len(), "Embedding batch");
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await
            .map_err(|e| KnowledgeError::Embedding(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(KnowledgeError::Embedding(format!(
                "expected {} embeddings, provider returned {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        let mut embeddings = response.embeddings;
        for v in &mut embeddings {
            normalize(v);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;
    use supportdesk_core::{
        AssistantTurn, EmbeddingResponse, ProviderError, ProviderRequest, ProviderResponse,
    };

    #[test]
    fn hashing_is_deterministic_and_normalized() {
        let e = HashingEmbedder::default();
        let a = e.embed_text("What is your return policy?");
        let b = e.embed_text("What is your return policy?");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashing_is_case_insensitive() {
        let e = HashingEmbedder::default();
        assert_eq!(e.embed_text("LAPTOP Returns"), e.embed_text("laptop return"));
    }

    #[test]
    fn stopwords_only_gives_zero_vector() {
        let e = HashingEmbedder::new(16);
        assert!(e.embed_text("what is the").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn shared_words_score_higher() {
        let e = HashingEmbedder::default();
        let q = e.embed_text("refund for a return");
        let related = e.embed_text("Return Policy: refund processing time 5-7 business days");
        let unrelated = e.embed_text("Shipping Options: Express overnight delivery");
        assert!(cosine_similarity(&q, &related) > cosine_similarity(&q, &unrelated));
    }

    struct FixedEmbeddings(Vec<Vec<f32>>);

    #[async_trait]
    impl Provider for FixedEmbeddings {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                turn: AssistantTurn::answer(""),
                usage: None,
                model: "fixed".into(),
            })
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: self.0.iter().take(request.inputs.len()).cloned().collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn provider_embedder_normalizes() {
        let embedder = ProviderEmbedder::new(Arc::new(FixedEmbeddings(vec![vec![3.0, 4.0]])), "m");
        let out = embedder.embed(&["x".to_string()]).await.unwrap();
        assert!((out[0][0] - 0.6).abs() < 1e-6);
        assert!((out[0][1] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn provider_embedder_count_mismatch_is_error() {
        let embedder = ProviderEmbedder::new(Arc::new(FixedEmbeddings(vec![vec![1.0]])), "m");
        let err = embedder
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Embedding(_)));
    }

    #[tokio::test]
    async fn provider_without_embeddings_fails() {
        struct NoEmbed;
        #[async_trait]
        impl Provider for NoEmbed {
            fn name(&self) -> &str {
                "none"
            }
            async fn complete(&self, _r: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
                Err(ProviderError::NotConfigured("none".into()))
            }
        }
        let embedder = ProviderEmbedder::new(Arc::new(NoEmbed), "m");
        assert!(embedder.embed(&["a".to_string()]).await.is_err());
    }
}
