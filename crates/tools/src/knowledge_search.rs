//! Semantic search over the knowledge index, formatted for the model.

use crate::call::{SearchArgs, ToolName};
use supportdesk_core::{KnowledgeError, ToolError};
use supportdesk_knowledge::{Category, ScoredDocument, VectorIndex};

const RULE_WIDTH: usize = 60;

/// Relevance tier label for a `[0, 1]` score.
pub fn relevance_tier(score: f32) -> &'static str {
    if score >= 0.7 {
        "🎯 High"
    } else if score >= 0.5 {
        "✓ Medium"
    } else if score >= 0.3 {
        "~ Low"
    } else {
        "? Very Low"
    }
}

fn search_error(err: KnowledgeError) -> ToolError {
    let tool_name = ToolName::SearchKnowledgeBase.to_string();
    match err {
        KnowledgeError::Embedding(reason) => ToolError::Unavailable { tool_name, reason },
        other => ToolError::ExecutionFailed {
            tool_name,
            reason: other.to_string(),
        },
    }
}

pub async fn search_knowledge_base(index: &VectorIndex, args: &SearchArgs) -> Result<String, ToolError> {
    let categories = Category::parse_list(&args.categories);
    let min_score = args.min_score();

    let hits = index
        .search_with_scores(&args.query, args.limit(), &categories, min_score)
        .await
        .map_err(search_error)?;

    let category_names = categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if hits.is_empty() {
        let mut text = String::from("No relevant information found");
        if !categories.is_empty() {
            text.push_str(&format!(" (filtered by: {category_names})"));
        }
        if min_score > 0.0 {
            text.push_str(&format!(" with minimum score {min_score}"));
        }
        text.push_str(".\n\nTry:\n- Broader search terms\n- Lower similarity threshold\n- Removing category filters");
        return Ok(text);
    }

    Ok(render_results(&args.query, &category_names, min_score, &hits))
}

fn render_results(query: &str, category_names: &str, min_score: f32, hits: &[ScoredDocument<'_>]) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut lines = vec![
        "Vector Knowledge Base Search Results:\n".to_string(),
        format!("Query: '{query}'\n"),
    ];
    if !category_names.is_empty() {
        lines.push(format!("Categories: {category_names}"));
    }
    if min_score > 0.0 {
        lines.push(format!("Min Similarity: {min_score:.2}"));
    }
    lines.push(format!("\nFound {} relevant result(s):\n", hits.len()));
    lines.push(rule.clone());

    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!(
            "\nResult #{} | Relevance: {} ({:.3})",
            i + 1,
            relevance_tier(hit.score),
            hit.score
        ));
        lines.push(format!(
            "Category: {} | Type: {}",
            hit.document.category.title(),
            hit.document.doc_type
        ));
        lines.push(rule.clone());
        lines.push(hit.document.text.trim().to_string());
        lines.push(rule.clone());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use supportdesk_knowledge::{DocType, Embedder, HashingEmbedder, KnowledgeDocument};

    async fn index() -> VectorIndex {
        let docs = vec![
            KnowledgeDocument::new(
                "Return Policy:\n- Time limit: 30 days\n- Refund processing time: 5-7 business days\n",
                Category::Return,
                DocType::Policy,
            ),
            KnowledgeDocument::new(
                "Shipping Options:\n- Express: 2 business days - $12.99\n",
                Category::Shipping,
                DocType::Policy,
            ),
        ];
        VectorIndex::build(docs, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap()
    }

    fn args(query: &str) -> SearchArgs {
        SearchArgs {
            query: query.into(),
            max_results: None,
            categories: String::new(),
            min_similarity_score: None,
        }
    }

    #[test]
    fn tiers() {
        assert_eq!(relevance_tier(0.95), "🎯 High");
        assert_eq!(relevance_tier(0.7), "🎯 High");
        assert_eq!(relevance_tier(0.5), "✓ Medium");
        assert_eq!(relevance_tier(0.3), "~ Low");
        assert_eq!(relevance_tier(0.1), "? Very Low");
    }

    #[tokio::test]
    async fn formats_results_with_header_and_rules() {
        let out = search_knowledge_base(&index().await, &args("return refund policy"))
            .await
            .unwrap();
        assert!(out.starts_with("Vector Knowledge Base Search Results:\n\nQuery: 'return refund policy'\n"));
        assert!(out.contains("Found 2 relevant result(s):"));
        assert!(out.contains("\nResult #1 | Relevance: "));
        assert!(out.contains("Category: Return | Type: policy"));
        assert!(out.contains(&"-".repeat(60)));
        assert!(out.find("Return Policy").unwrap() < out.find("Shipping Options").unwrap());
    }

    #[tokio::test]
    async fn category_filter_is_reported() {
        let mut a = args("delivery");
        a.categories = "shipping, bogus".into();
        let out = search_knowledge_base(&index().await, &a).await.unwrap();
        assert!(out.contains("Categories: shipping"));
        assert!(!out.contains("Return Policy"));
    }

    #[tokio::test]
    async fn no_results_mentions_filters_and_threshold() {
        let mut a = args("refund");
        a.categories = "payment".into();
        a.min_similarity_score = Some(0.5);
        let out = search_knowledge_base(&index().await, &a).await.unwrap();
        assert!(out.starts_with("No relevant information found (filtered by: payment) with minimum score 0.5."));
        assert!(out.ends_with("- Removing category filters"));
    }

    #[tokio::test]
    async fn no_results_without_threshold_omits_score_clause() {
        let mut a = args("refund");
        a.categories = "general".into();
        let out = search_knowledge_base(&index().await, &a).await.unwrap();
        assert!(out.starts_with("No relevant information found (filtered by: general).\n\nTry:"));
    }

    struct Offline;

    #[async_trait]
    impl Embedder for Offline {
        fn name(&self) -> &str {
            "offline"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            if texts.len() > 1 {
                Ok(texts.iter().map(|_| vec![1.0]).collect())
            } else {
                Err(KnowledgeError::Embedding("connection refused".into()))
            }
        }
    }

    #[tokio::test]
    async fn embedding_outage_is_unavailable() {
        let docs = vec![
            KnowledgeDocument::new("a", Category::General, DocType::Info),
            KnowledgeDocument::new("b", Category::General, DocType::Info),
        ];
        let index = VectorIndex::build(docs, Arc::new(Offline)).await.unwrap();
        let err = search_knowledge_base(&index, &args("anything")).await.unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { .. }));
    }
}
