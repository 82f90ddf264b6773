//! Startup wiring shared by every command: config, provider, index, agent.

use std::path::Path;
use std::sync::Arc;
use supportdesk_agent::{ConversationManager, SupportAgent};
use supportdesk_config::{AppConfig, EmbedderKind};
use supportdesk_core::{EventBus, Provider};
use supportdesk_knowledge::{Embedder, HashingEmbedder, ProviderEmbedder, VectorIndex};
use supportdesk_tools::SupportToolbox;
use tracing::info;

type BoxError = Box<dyn std::error::Error>;

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, BoxError> {
    let config = match path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

pub fn default_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, BoxError> {
    let router = supportdesk_providers::build_from_config(config);
    router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", config.default_provider).into())
}

pub fn embedder(config: &AppConfig, provider: &Arc<dyn Provider>) -> Arc<dyn Embedder> {
    match config.knowledge.embedder {
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.knowledge.dimensions)),
        EmbedderKind::Provider => Arc::new(ProviderEmbedder::new(
            provider.clone(),
            config.knowledge.embedding_model.clone(),
        )),
    }
}

/// Load the knowledge source and embed it. Fails the whole startup on error.
pub async fn build_index(
    config: &AppConfig,
    provider: &Arc<dyn Provider>,
) -> Result<Arc<VectorIndex>, BoxError> {
    let path = &config.knowledge.path;
    let index = VectorIndex::from_path(path, embedder(config, provider))
        .await
        .map_err(|e| format!("Failed to build knowledge index from {}: {e}", path.display()))?;
    info!(documents = index.len(), path = %path.display(), "Knowledge index ready");
    Ok(Arc::new(index))
}

/// Everything a command needs to run user turns.
pub async fn build_manager(config: &AppConfig) -> Result<Arc<ConversationManager>, BoxError> {
    let provider = default_provider(config)?;
    let index = build_index(config, &provider).await?;

    let event_bus = Arc::new(EventBus::default());
    event_bus.spawn_logger();
    let tools = Arc::new(SupportToolbox::with_sample_data(index).with_event_bus(event_bus.clone()));
    let agent = SupportAgent::from_config(config, provider, tools, event_bus);

    info!(
        provider = %config.default_provider,
        model = %config.default_model,
        max_round_trips = config.agent.max_round_trips,
        "Support agent ready"
    );
    Ok(Arc::new(ConversationManager::new(agent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_path_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = \"qwen2.5:7b\"\n[agent]\nmax_round_trips = 4").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.default_model, "qwen2.5:7b");
        assert_eq!(config.agent.max_round_trips, 4);
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_temperature = 9.0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[tokio::test]
    async fn hashing_index_builds_from_bundled_knowledge_base() {
        let mut config = AppConfig::default();
        config.knowledge.path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../data/knowledge_base.json");
        let provider = default_provider(&config).unwrap();

        let index = build_index(&config, &provider).await.unwrap();
        assert!(!index.is_empty());
    }

    #[tokio::test]
    async fn missing_knowledge_file_fails_startup() {
        let mut config = AppConfig::default();
        config.knowledge.path = "/nonexistent/knowledge_base.json".into();
        let provider = default_provider(&config).unwrap();

        let err = build_index(&config, &provider).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/knowledge_base.json"));
    }
}
