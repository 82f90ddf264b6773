//! Typed settings for the support agent, read from TOML.
//!
//! The file is optional: every field has a default, and a handful of
//! environment variables override what the file says. Validation runs after
//! each load so a bad value stops startup instead of surfacing mid-conversation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.supportdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature. Zero keeps tool selection reproducible.
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// ReAct loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Knowledge base and embedding settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.1:latest".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("knowledge", &self.knowledge)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model invocations allowed per user turn before the loop escalates
    #[serde(default = "default_max_round_trips")]
    pub max_round_trips: usize,

    /// Upper bound on a single model call
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Replace the built-in system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_round_trips() -> usize {
    8
}
fn default_model_timeout_secs() -> u64 {
    60
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_round_trips: default_max_round_trips(),
            model_timeout_secs: default_model_timeout_secs(),
            system_prompt_override: None,
        }
    }
}

/// Which embedding function backs the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Deterministic token hashing, no network
    Hashing,
    /// The configured provider's embeddings endpoint
    Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the knowledge base JSON document
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,

    #[serde(default = "default_embedder")]
    pub embedder: EmbedderKind,

    /// Embedding model name, used with `embedder = "provider"`
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Vector width for the hashing embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/knowledge_base.json")
}
fn default_embedder() -> EmbedderKind {
    EmbedderKind::Hashing
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_dimensions() -> usize {
    384
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
            embedder: default_embedder(),
            embedding_model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8088
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Keys consulted, in order, when no `api_key` is set in the file.
const API_KEY_VARS: [&str; 3] = ["SUPPORTDESK_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"];

impl AppConfig {
    /// `~/.supportdesk/config.toml` plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides and re-validate.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a single file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values. `lookup` abstracts `std::env::var`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS.iter().find_map(|key| lookup(*key));
        }
        if let Some(provider) = lookup("SUPPORTDESK_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("SUPPORTDESK_MODEL") {
            self.default_model = model;
        }
    }

    pub fn config_dir() -> PathBuf {
        home_dir().join(".supportdesk")
    }

    /// Check every setting and report all problems together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (
                (0.0..=2.0).contains(&self.default_temperature),
                "default_temperature must be between 0.0 and 2.0",
            ),
            (self.agent.max_round_trips > 0, "agent.max_round_trips must be at least 1"),
            (self.agent.model_timeout_secs > 0, "agent.model_timeout_secs must be > 0"),
            (
                self.knowledge.embedder != EmbedderKind::Hashing || self.knowledge.dimensions > 0,
                "knowledge.dimensions must be > 0",
            ),
            (!self.default_provider.trim().is_empty(), "default_provider must not be empty"),
        ];

        let problems: Vec<&str> = checks
            .iter()
            .filter(|(ok, _)| !ok)
            .map(|(_, problem)| *problem)
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(problems.join("; ")))
        }
    }

    /// API key for `provider`: per-provider entry first, then the global key.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            knowledge: KnowledgeConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn home_dir() -> PathBuf {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("invalid TOML in {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.default_temperature, 0.0);
        assert_eq!(config.agent.max_round_trips, 8);
        assert_eq!(config.knowledge.embedder, EmbedderKind::Hashing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.knowledge.path, config.knowledge.path);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_trips_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_round_trips = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_round_trips"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "llama3.1:latest");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_provider = "openai"
default_model = "gpt-4o-mini"

[agent]
max_round_trips = 3

[knowledge]
embedder = "provider"
embedding_model = "text-embedding-3-small"

[providers.openai]
api_key = "sk-test"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.agent.max_round_trips, 3);
        assert_eq!(config.agent.model_timeout_secs, 60);
        assert_eq!(config.knowledge.embedder, EmbedderKind::Provider);
        assert_eq!(config.api_key_for("openai").as_deref(), Some("sk-test"));
        assert_eq!(config.gateway.port, 8088);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_temperature = \"hot\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn unknown_embedder_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[knowledge]\nembedder = \"magic\"").unwrap();
        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-also-secret".into()),
                ..ProviderConfig::default()
            },
        );
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn every_validation_problem_is_reported() {
        let mut config = AppConfig {
            default_temperature: -1.0,
            ..AppConfig::default()
        };
        config.agent.model_timeout_secs = 0;
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("default_temperature"));
        assert!(message.contains("model_timeout_secs"));
    }

    #[test]
    fn env_overrides_fill_missing_key_and_replace_model() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENROUTER_API_KEY", "sk-router"),
            ("SUPPORTDESK_MODEL", "qwen2.5:7b"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-router"));
        assert_eq!(config.default_model, "qwen2.5:7b");
        assert_eq!(config.default_provider, "ollama");
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|_| Some("sk-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }
}
