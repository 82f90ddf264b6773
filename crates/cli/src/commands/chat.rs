//! `supportdesk chat`: Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;
use supportdesk_agent::{CancellationToken, ConversationManager};
use supportdesk_config::AppConfig;
use supportdesk_core::ConversationId;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::runtime;

pub async fn run(
    config: AppConfig,
    message: Option<String>,
    conversation: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = runtime::build_manager(&config).await?;
    let conversation_id = conversation
        .as_deref()
        .map(ConversationId::from)
        .unwrap_or_default();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let answer = manager.submit(&conversation_id, &msg).await;
        eprint!("\r              \r");
        println!("{}", answer?);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       SupportDesk Agent: Interactive Mode   ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:      {}", config.default_provider);
    println!("  Model:         {}", config.default_model);
    println!("  Conversation:  {conversation_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Ctrl+C stops the current answer; 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = run_interruptible(&manager, &conversation_id, line).await;
        eprint!("\r     \r");

        match result {
            Ok(answer) => {
                println!();
                for line in answer.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) if e.is_retryable() => {
                eprintln!("  [Error] {e} (you can send the message again)");
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Run one turn; Ctrl+C cancels it instead of killing the process.
async fn run_interruptible(
    manager: &Arc<ConversationManager>,
    conversation_id: &ConversationId,
    text: &str,
) -> supportdesk_core::Result<String> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = manager.submit_turn(conversation_id, text, &cancel).await;
    watcher.abort();
    outcome.map(|o| o.answer)
}
