//! `supportdesk config`: Print the effective configuration.

use supportdesk_config::AppConfig;

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{}", render(config)?);
    Ok(())
}

/// The config as TOML with every secret removed.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut redacted = config.clone();
    redacted.api_key = redacted.api_key.map(|_| "***".into());
    for provider in redacted.providers.values_mut() {
        provider.api_key = provider.api_key.take().map(|_| "***".into());
    }
    toml::to_string_pretty(&redacted)
}
