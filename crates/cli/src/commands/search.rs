//! `supportdesk search`: Query the knowledge base without the model.

use supportdesk_config::AppConfig;
use supportdesk_tools::SupportToolbox;
use supportdesk_tools::call::{SearchArgs, SupportToolCall};

use crate::runtime;

pub async fn run(
    config: AppConfig,
    query: String,
    max_results: i64,
    category: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = runtime::default_provider(&config)?;
    let index = runtime::build_index(&config, &provider).await?;
    let toolbox = SupportToolbox::with_sample_data(index);

    let text = toolbox.dispatch(&search_call(query, max_results, category)).await?;
    println!("{text}");
    Ok(())
}

fn search_call(query: String, max_results: i64, category: String) -> SupportToolCall {
    SupportToolCall::SearchKnowledgeBase(SearchArgs {
        query,
        max_results: Some(max_results),
        categories: category,
        min_similarity_score: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn bundled_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.knowledge.path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../data/knowledge_base.json");
        config
    }

    #[tokio::test]
    async fn search_uses_the_tool_formatter() {
        let config = bundled_config();
        let provider = runtime::default_provider(&config).unwrap();
        let toolbox = SupportToolbox::with_sample_data(runtime::build_index(&config, &provider).await.unwrap());

        let text = toolbox
            .dispatch(&search_call("return policy".into(), 2, "return".into()))
            .await
            .unwrap();
        assert!(text.contains("relevant result(s)"), "{text}");
        assert!(text.contains("Category: Return"), "{text}");
    }

    #[tokio::test]
    async fn blank_query_reports_nothing_found() {
        let config = bundled_config();
        let provider = runtime::default_provider(&config).unwrap();
        let toolbox = SupportToolbox::with_sample_data(runtime::build_index(&config, &provider).await.unwrap());

        let text = toolbox
            .dispatch(&search_call("   ".into(), 3, "all".into()))
            .await
            .unwrap();
        assert!(text.starts_with("No relevant information found"), "{text}");
    }
}
