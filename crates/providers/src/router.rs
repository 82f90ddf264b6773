//! Named provider registry, populated from `[providers.*]` config sections.

use crate::openai_compat::OpenAiCompatProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use supportdesk_config::AppConfig;
use supportdesk_core::provider::Provider;

pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Registering an existing name replaces the earlier provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` entry is registered, and the default provider is
/// always present even when it has no explicit section.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, section) in &config.providers {
        let base_url = section
            .api_url
            .clone()
            .unwrap_or_else(|| well_known_base_url(name));
        let api_key = config.api_key_for(name).unwrap_or_default();
        router.register(name.clone(), connect(name, base_url, api_key));
    }

    if router.default().is_none() {
        let name = &config.default_provider;
        let api_key = config.api_key.clone().unwrap_or_default();
        router.register(name.clone(), connect(name, well_known_base_url(name), api_key));
    }

    router
}

fn connect(name: &str, base_url: String, api_key: String) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
}

/// API roots for providers that need no `api_url` override.
fn well_known_base_url(provider_name: &str) -> String {
    let url = match provider_name {
        "ollama" => "http://localhost:11434/v1",
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        other => return format!("https://{other}.api.example.com/v1"),
    };
    url.to_owned()
}
