//! SupportDesk CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive chat or single-message mode
//! - `serve`: Start the HTTP gateway
//! - `search`: Probe the knowledge base directly
//! - `tools`: List the tool catalogue
//! - `config`: Print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "supportdesk",
    about = "SupportDesk: customer-support agent over a semantic knowledge base",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.supportdesk/config.toml)
    #[arg(long, global = true, env = "SUPPORTDESK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the support agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation id (a fresh one is generated when omitted)
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Search the knowledge base without involving the model
    Search {
        query: String,

        /// Maximum number of results (1-10)
        #[arg(short = 'k', long, default_value_t = 3)]
        max_results: i64,

        /// Comma-separated categories, or "all"
        #[arg(long, default_value = "all")]
        category: String,
    },

    /// List the tools the agent can call
    Tools,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = runtime::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat {
            message,
            conversation,
        } => commands::chat::run(config, message, conversation).await?,
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Search {
            query,
            max_results,
            category,
        } => commands::search::run(config, query, max_results, category).await?,
        Commands::Tools => commands::tools::run(),
        Commands::Config => commands::config_cmd::show(&config)?,
    }

    Ok(())
}
