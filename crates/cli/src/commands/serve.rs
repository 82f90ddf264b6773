//! `supportdesk serve`: Start the HTTP API server.

use supportdesk_config::AppConfig;

use crate::runtime;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let manager = runtime::build_manager(&config).await?;

    println!("🎧 SupportDesk Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.default_model);

    supportdesk_gateway::start(&config, manager).await?;

    Ok(())
}
