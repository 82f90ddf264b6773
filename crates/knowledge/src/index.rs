//! The in-memory vector index over knowledge passages.
//!
//! Built once at startup and shared read-only (behind an `Arc`) by every
//! conversation. There is no update or delete; rebuilding the process
//! rebuilds the index.

use crate::category::Category;
use crate::document::{KnowledgeDocument, load_source};
use crate::embedding::Embedder;
use crate::vector::{cosine_similarity, relevance, top_k};
use std::path::Path;
use std::sync::Arc;
use supportdesk_core::KnowledgeError;
use tracing::{debug, info};

/// Returned by [`VectorIndex::search`] when nothing matches.
pub const NO_RESULTS: &str = "No relevant information found in the knowledge base.";

/// A passage paired with its `[0, 1]` relevance to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument<'a> {
    pub document: &'a KnowledgeDocument,
    pub score: f32,
}

pub struct VectorIndex {
    documents: Vec<KnowledgeDocument>,
    embedder: Arc<dyn Embedder>,
    dimensions: Option<usize>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("documents", &self.documents.len())
            .field("embedder", &self.embedder.name())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl VectorIndex {
    /// Embed every document in one batch and build the index.
    ///
    /// Any embedding failure here is fatal: the index is never partially built.
    pub async fn build(
        mut documents: Vec<KnowledgeDocument>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, KnowledgeError> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(&texts).await?
        };

        if embeddings.len() != documents.len() {
            return Err(KnowledgeError::Embedding(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len);
        for (doc, embedding) in documents.iter_mut().zip(embeddings) {
            if let Some(expected) = dimensions {
                if embedding.len() != expected {
                    return Err(KnowledgeError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
            }
            doc.embedding = embedding;
        }

        info!(
            documents = documents.len(),
            embedder = embedder.name(),
            dimensions = dimensions.unwrap_or(0),
            "Knowledge index built"
        );

        Ok(Self {
            documents,
            embedder,
            dimensions,
        })
    }

    /// Load a JSON knowledge source, render it and build the index.
    pub async fn from_path(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, KnowledgeError> {
        let documents = load_source(path)?.into_documents();
        Self::build(documents, embedder).await
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    /// Top `k` passages for `query`, optionally restricted to one category,
    /// joined by blank lines in descending similarity order.
    ///
    /// Returns [`NO_RESULTS`] for an empty query, an empty index, or a
    /// category with no documents.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        category: Option<Category>,
    ) -> Result<String, KnowledgeError> {
        let filter: Vec<Category> = category.into_iter().collect();
        let hits = self.rank(query, k, &filter).await?;
        if hits.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }

        Ok(hits
            .iter()
            .map(|(pos, _)| self.documents[*pos].text.trim())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Top `k` passages with relevance scores. `categories` is a union filter
    /// (empty means every category); results scoring below `min_score` are dropped.
    pub async fn search_with_scores(
        &self,
        query: &str,
        k: usize,
        categories: &[Category],
        min_score: f32,
    ) -> Result<Vec<ScoredDocument<'_>>, KnowledgeError> {
        let hits = self.rank(query, k, categories).await?;
        Ok(hits
            .into_iter()
            .map(|(pos, cosine)| ScoredDocument {
                document: &self.documents[pos],
                score: relevance(cosine),
            })
            .filter(|s| s.score >= min_score)
            .collect())
    }

    async fn rank(
        &self,
        query: &str,
        k: usize,
        categories: &[Category],
    ) -> Result<Vec<(usize, f32)>, KnowledgeError> {
        let query = query.trim();
        if query.is_empty() || k == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<usize> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, d)| categories.is_empty() || categories.contains(&d.category))
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::Embedding("embedder returned no vector for query".into()))?;

        if let Some(expected) = self.dimensions {
            if query_vec.len() != expected {
                return Err(KnowledgeError::DimensionMismatch {
                    expected,
                    actual: query_vec.len(),
                });
            }
        }

        let scored = candidates
            .into_iter()
            .map(|i| (i, cosine_similarity(&query_vec, &self.documents[i].embedding)))
            .collect();
        let ranked = top_k(scored, k);
        debug!(query, k, hits = ranked.len(), "Vector search");
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::DocType;
    use crate::embedding::HashingEmbedder;
    use async_trait::async_trait;

    fn doc(text: &str, category: Category) -> KnowledgeDocument {
        KnowledgeDocument::new(text, category, DocType::Policy)
    }

    async fn sample_index() -> VectorIndex {
        let docs = vec![
            doc("Return Policy: 30 days, refund in 5-7 business days", Category::Return),
            doc("Shipping Options: standard 5-7 days, express 2 days", Category::Shipping),
            doc("Payment Information: Visa, Mastercard, PayPal", Category::Payment),
            doc("Warranty Information: 1 year standard warranty", Category::Product),
            doc("Question: Can I change my order? Answer: within 1 hour", Category::General),
        ];
        VectorIndex::build(docs, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn search_ranks_relevant_document_first() {
        let index = sample_index().await;
        let out = index.search("how long does a refund take after a return", 1, None).await.unwrap();
        assert!(out.starts_with("Return Policy"));
    }

    #[tokio::test]
    async fn search_category_filter_only_returns_that_category() {
        let index = sample_index().await;
        let out = index.search("refund", 5, Some(Category::Payment)).await.unwrap();
        assert!(out.starts_with("Payment Information"));
        assert!(!out.contains("Return Policy"));
    }

    #[tokio::test]
    async fn search_joins_results_with_blank_line() {
        let index = sample_index().await;
        let out = index.search("days", 2, None).await.unwrap();
        assert_eq!(out.split("\n\n").count(), 2);
    }

    #[tokio::test]
    async fn empty_query_and_empty_category_give_no_results() {
        let docs = vec![doc("Return Policy: 30 days", Category::Return)];
        let index = VectorIndex::build(docs, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        assert_eq!(index.search("   ", 3, None).await.unwrap(), NO_RESULTS);
        assert_eq!(index.search("return", 3, Some(Category::Shipping)).await.unwrap(), NO_RESULTS);
    }

    #[tokio::test]
    async fn empty_index_gives_no_results() {
        let index = VectorIndex::build(Vec::new(), Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        assert!(index.is_empty());
        assert_eq!(index.search("anything", 3, None).await.unwrap(), NO_RESULTS);
        assert!(index.search_with_scores("anything", 3, &[], 0.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scores_are_bounded_and_sorted() {
        let index = sample_index().await;
        let hits = index.search_with_scores("return refund policy", 5, &[], 0.0).await.unwrap();
        assert_eq!(hits.len(), 5);
        for w in hits.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
        assert_eq!(hits[0].document.category, Category::Return);
    }

    #[tokio::test]
    async fn category_set_is_a_union() {
        let index = sample_index().await;
        let hits = index
            .search_with_scores("information", 10, &[Category::Payment, Category::Product], 0.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| matches!(h.document.category, Category::Payment | Category::Product)));
    }

    #[tokio::test]
    async fn min_score_discards_weak_matches() {
        let index = sample_index().await;
        let hits = index.search_with_scores("return refund", 5, &[], 0.99).await.unwrap();
        assert!(hits.iter().all(|h| h.score >= 0.99));
        assert!(hits.len() < 5);
    }

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        fn name(&self) -> &str {
            "constant"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let docs = vec![
            doc("alpha", Category::General),
            doc("beta", Category::General),
            doc("gamma", Category::General),
        ];
        let index = VectorIndex::build(docs, Arc::new(ConstantEmbedder)).await.unwrap();
        let out = index.search("anything", 3, None).await.unwrap();
        assert_eq!(out, "alpha\n\nbeta\n\ngamma");
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            Err(KnowledgeError::Embedding("model failed to load".into()))
        }
    }

    #[tokio::test]
    async fn build_fails_when_embedding_fails() {
        let err = VectorIndex::build(vec![doc("x", Category::General)], Arc::new(BrokenEmbedder))
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Embedding(_)));
    }

    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        fn name(&self) -> &str {
            "ragged"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            Ok(texts.iter().enumerate().map(|(i, _)| vec![1.0; i + 1]).collect())
        }
    }

    #[tokio::test]
    async fn build_rejects_mixed_dimensions() {
        let docs = vec![doc("a", Category::General), doc("b", Category::General)];
        let err = VectorIndex::build(docs, Arc::new(RaggedEmbedder)).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::DimensionMismatch { expected: 1, actual: 2 }));
    }
}
