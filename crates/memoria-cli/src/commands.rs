//! Slash commands for the interactive REPL.

use anyhow::{Context, Result};
use memoria_config::MemoriaConfig;
use memoria_session::{CompactionOutcome, MemorySession, estimate_tokens};
use memoria_types::{Role, preview_str};
use std::path::{Path, PathBuf};

/// Hits shown by `/search`.
const SEARCH_RESULTS: usize = 5;

/// Messages shown by `/history` without an argument.
const DEFAULT_HISTORY: usize = 10;

/// Byte width of one-line message previews.
const PREVIEW_BYTES: usize = 100;

/// File under the config directory used by `/export` and `/import` without a path.
const DEFAULT_SNAPSHOT_FILE: &str = "memory.json";

pub enum SlashResult {
    Continue,
    Break,
    Unknown,
}

/// Run `input` if it is a slash command. Returns `None` for ordinary chat input.
pub async fn handle_slash_command(
    input: &str,
    session: &mut MemorySession,
    config: &MemoriaConfig,
) -> Option<SlashResult> {
    if !input.starts_with('/') {
        return None;
    }

    let (cmd, args) = match input.split_once(' ') {
        Some((c, a)) => (c, Some(a.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    match cmd {
        "/quit" | "/exit" => Some(SlashResult::Break),
        "/help" => {
            print_help();
            Some(SlashResult::Continue)
        }
        "/search" => {
            match args {
                Some(query) => handle_search(session, query),
                None => eprintln!("Usage: /search <query>"),
            }
            Some(SlashResult::Continue)
        }
        "/stats" => {
            handle_stats(session, config);
            Some(SlashResult::Continue)
        }
        "/history" => {
            match parse_history_limit(args) {
                Ok(limit) => handle_history(session, limit),
                Err(e) => eprintln!("{e}"),
            }
            Some(SlashResult::Continue)
        }
        "/summary" => {
            println!("{}", session.overview().await);
            Some(SlashResult::Continue)
        }
        "/intent" => {
            match args {
                Some(message) => {
                    let intent = session.classify_intent(message).await;
                    println!("{} (confidence {:.2})", intent.label, intent.confidence);
                }
                None => eprintln!("Usage: /intent <message>"),
            }
            Some(SlashResult::Continue)
        }
        "/facts" => {
            let facts = session.key_facts().await;
            if facts.is_empty() {
                eprintln!("No key facts found.");
            }
            for fact in &facts {
                println!("{fact}");
            }
            Some(SlashResult::Continue)
        }
        "/compact" => {
            let outcome = session.compact_now().await;
            eprintln!("{}", describe_outcome(&outcome));
            Some(SlashResult::Continue)
        }
        "/clear" => {
            session.clear();
            log_compaction(session.add(Role::System, config.system_prompt.as_str(), None).await);
            eprintln!("Memory cleared.");
            Some(SlashResult::Continue)
        }
        "/export" => {
            let path = snapshot_path(args, config);
            match export_to(session, &path).await {
                Ok(()) => eprintln!("Exported {} messages to {}", session.len(), path.display()),
                Err(e) => eprintln!("Export failed: {e:#}"),
            }
            Some(SlashResult::Continue)
        }
        "/import" => {
            let path = snapshot_path(args, config);
            match import_from(session, &path).await {
                Ok(()) => eprintln!("Imported {} messages from {}", session.len(), path.display()),
                Err(e) => eprintln!("Import failed: {e:#}"),
            }
            Some(SlashResult::Continue)
        }
        _ => Some(SlashResult::Unknown),
    }
}

/// Report a compaction pass triggered by an add.
pub fn log_compaction(outcome: Option<CompactionOutcome>) {
    if let Some(outcome) = outcome {
        tracing::debug!("{}", describe_outcome(&outcome));
    }
}

fn describe_outcome(outcome: &CompactionOutcome) -> String {
    match outcome {
        CompactionOutcome::Compacted {
            batch_size,
            messages_removed,
        } => format!("Summarized {batch_size} messages, removed {messages_removed} from memory."),
        CompactionOutcome::Skipped => "Nothing to compact.".to_string(),
        CompactionOutcome::Failed { reason } => {
            format!("Summarization failed ({reason}); memory unchanged.")
        }
    }
}

fn handle_search(session: &MemorySession, query: &str) {
    let hits = session.search(query, SEARCH_RESULTS);
    if hits.is_empty() {
        eprintln!("No matching messages.");
        return;
    }
    for hit in hits {
        println!(
            "  [{}] {}: {}",
            hit.score,
            hit.message.role.label(),
            preview_str(&hit.message.content, PREVIEW_BYTES)
        );
    }
}

fn handle_stats(session: &MemorySession, config: &MemoriaConfig) {
    let stats = session.statistics();
    let context = session.assemble_context(true, config.memory.recent_count);
    eprintln!("Messages: {}/{} ({} used)", stats.current_messages, stats.capacity, stats.utilization_label());
    eprintln!("Total added: {}", stats.total_messages);
    eprintln!("Summaries: {}", stats.summaries_created);
    eprintln!("Next context: {} entries, ~{} tokens", context.len(), estimate_tokens(&context));
    eprintln!("Created: {}", stats.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn parse_history_limit(args: Option<&str>) -> Result<usize, String> {
    match args {
        None => Ok(DEFAULT_HISTORY),
        Some(n) => n
            .parse::<usize>()
            .map_err(|_| format!("Usage: /history [n] (got {n:?})")),
    }
}

fn handle_history(session: &MemorySession, limit: usize) {
    let messages = session.messages(Some(limit), false);
    if messages.is_empty() {
        eprintln!("No messages yet.");
        return;
    }
    for message in messages {
        println!(
            "  {} {}: {}",
            message.created_at.format("%H:%M:%S"),
            message.role.label(),
            preview_str(&message.content, PREVIEW_BYTES)
        );
    }
}

fn snapshot_path(args: Option<&str>, config: &MemoriaConfig) -> PathBuf {
    match args {
        Some(path) => PathBuf::from(path),
        None => config.config_dir.join(DEFAULT_SNAPSHOT_FILE),
    }
}

async fn export_to(session: &MemorySession, path: &Path) -> Result<()> {
    let json = session.export().to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

async fn import_from(session: &mut MemorySession, path: &Path) -> Result<()> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    session.import_json(&json)?;
    Ok(())
}

fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /help           Show this help");
    eprintln!("  /search <q>     Find past messages by keyword");
    eprintln!("  /stats          Show memory usage");
    eprintln!("  /history [n]    Show the last n messages (default {DEFAULT_HISTORY})");
    eprintln!("  /summary        Summarize the whole conversation");
    eprintln!("  /facts          Extract key facts from the conversation");
    eprintln!("  /intent <msg>   Classify the intent of a message");
    eprintln!("  /compact        Summarize older messages now");
    eprintln!("  /clear          Forget everything and start over");
    eprintln!("  /export [path]  Save memory to a JSON file (default ~/.memoria/{DEFAULT_SNAPSHOT_FILE})");
    eprintln!("  /import [path]  Replace memory from a JSON file (same default)");
    eprintln!("  /quit           Exit");
}
