//! Memoria CLI: a chat assistant with bounded, self-summarizing memory.

mod commands;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{SlashResult, handle_slash_command, log_compaction};
use memoria_api::{ApiClient, OpenAiProvider, RetryConfig};
use memoria_config::{CliOverrides, MemoriaConfig};
use memoria_session::{MemorySession, SessionRegistry};
use memoria_types::{ContextEntry, DeltaSink, ProviderError, Role, TextGenerator};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

const APOLOGY: &str = "I'm sorry, I couldn't generate a response right now. Please try again.";

#[derive(Parser)]
#[command(
    name = "memoria",
    version,
    about = "A chat assistant with bounded, self-summarizing memory"
)]
struct Cli {
    /// Send a single prompt and print the response (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens in the response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Behavior prompt seeded into the session
    #[arg(long)]
    system_prompt: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = MemoriaConfig::load(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        max_tokens: cli.max_tokens,
        system_prompt: cli.system_prompt,
    })
    .context("Failed to load configuration")?;

    let client = ApiClient::with_timeout(
        &config.api_key,
        &config.api_base_url,
        Duration::from_secs(config.timeout_secs),
    )
    .context("Failed to create API client")?
    .with_retry_config(RetryConfig::with_max_retries(config.max_retries));
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiProvider::from_client(client, config.model.clone()));

    let mut registry = SessionRegistry::new(config.memory, Arc::clone(&generator));
    let id = registry.create(&config.system_prompt);
    let session = registry.require_mut(id)?;

    if let Some(prompt) = cli.print {
        // Print mode: single turn, nothing persisted
        chat_turn(session, generator.as_ref(), &config, &prompt, &mut print_delta)
            .await
            .context("Chat request failed")?;
        println!();
        return Ok(());
    }

    eprintln!(
        "memoria v{} (model: {}, memory: {} messages, summarize at {}, session: {})",
        env!("CARGO_PKG_VERSION"),
        config.model,
        config.memory.capacity,
        config.memory.summary_threshold,
        id.simple().to_string().get(..8).unwrap_or_default(),
    );
    eprintln!("Type your message, /help for commands. Press Ctrl+D to exit.\n");

    repl(session, generator.as_ref(), &config).await
}

async fn repl(
    session: &mut MemorySession,
    generator: &dyn TextGenerator,
    config: &MemoriaConfig,
) -> Result<()> {
    let stdin = io::stdin();

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(handled) = handle_slash_command(input, session, config).await {
            match handled {
                SlashResult::Continue => continue,
                SlashResult::Break => break,
                SlashResult::Unknown => {
                    eprintln!("Unknown command: {input}. Type /help for available commands.");
                    continue;
                }
            }
        }

        let mut streamed = false;
        let mut on_delta = |delta: &str| {
            streamed = true;
            print_delta(delta);
        };
        match chat_turn(session, generator, config, input, &mut on_delta).await {
            Ok(_) => println!(),
            Err(e) => {
                if streamed {
                    println!();
                }
                tracing::warn!("Chat request failed: {e}");
                eprintln!("Error: {e}");
                println!("{APOLOGY}");
            }
        }
        println!();
    }

    let stats = session.statistics();
    eprintln!(
        "Session ended: {} messages total, {} summaries.",
        stats.total_messages, stats.summaries_created
    );
    Ok(())
}

/// Write a streamed fragment to stdout as soon as it arrives.
fn print_delta(delta: &str) {
    print!("{delta}");
    let _ = io::stdout().flush();
}

/// One conversational turn. The user message is recorded before the
/// request. Reply fragments go to `on_delta` as they stream in; the
/// assembled reply is recorded only when the stream completes with text.
async fn chat_turn(
    session: &mut MemorySession,
    generator: &dyn TextGenerator,
    config: &MemoriaConfig,
    input: &str,
    on_delta: DeltaSink<'_>,
) -> Result<String, ProviderError> {
    log_compaction(session.add(Role::User, input, None).await);

    let mut context = session.assemble_context(true, config.memory.recent_count);
    ContextEntry::ensure_system_prompt(&mut context, &config.system_prompt);

    let reply = generator
        .chat_stream(&context, config.temperature, config.max_tokens, on_delta)
        .await?;
    if reply.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    log_compaction(session.add(Role::Assistant, reply.clone(), None).await);
    Ok(reply)
}
