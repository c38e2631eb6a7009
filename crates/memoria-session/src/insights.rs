//! Whole-conversation overview, key-fact extraction and intent classification.

use crate::compact::render_transcript;
use crate::store::MessageStore;
use memoria_types::{Summary, TextGenerator};
use serde::Serialize;

/// Returned by [`overview`] when there is nothing to summarize.
pub const EMPTY_HISTORY: &str = "No conversation history available.";

/// Prefix of the text [`overview`] returns when generation fails.
pub const OVERVIEW_FAILED: &str = "Error generating summary";

/// Recent messages included alongside summaries in an overview.
const OVERVIEW_RECENT_MESSAGES: usize = 10;

const OVERVIEW_TEMPERATURE: f32 = 0.3;
const OVERVIEW_MAX_TOKENS: u32 = 800;

const FACTS_TEMPERATURE: f32 = 0.2;
const FACTS_MAX_TOKENS: u32 = 500;

const INTENT_TEMPERATURE: f32 = 0.1;
const INTENT_MAX_TOKENS: u32 = 50;

/// Confidence assigned when the model names an intent without a score.
const UNSCORED_CONFIDENCE: f32 = 0.5;

/// Label reported when classification fails.
pub const UNKNOWN_INTENT: &str = "unknown";

/// The primary intent behind a user message, as judged by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub label: String,
    pub confidence: f32,
}

impl Intent {
    fn unknown() -> Self {
        Self {
            label: UNKNOWN_INTENT.to_string(),
            confidence: 0.0,
        }
    }
}

/// Produce a comprehensive summary of the whole conversation.
///
/// Combines every stored summary with the latest messages. Returns
/// [`EMPTY_HISTORY`] without calling the generator when memory is empty.
/// A provider failure is logged and reported in the returned text,
/// prefixed with [`OVERVIEW_FAILED`].
pub async fn overview(
    generator: &dyn TextGenerator,
    store: &MessageStore,
    summaries: &[Summary],
) -> String {
    if store.is_empty() && summaries.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut parts = Vec::new();
    if !summaries.is_empty() {
        parts.push("Previous summaries:".to_string());
        parts.extend(summaries.iter().map(|s| s.text.clone()));
    }
    if !store.is_empty() {
        parts.push("\nRecent conversation:".to_string());
        parts.push(render_transcript(store.recent(OVERVIEW_RECENT_MESSAGES)));
    }
    let history = parts.join("\n");

    let prompt = format!(
        "Create a comprehensive summary of this conversation, including:\n\
         1. Overall context and purpose\n\
         2. Main topics covered\n\
         3. Key insights and information\n\
         4. Current state and any pending items\n\
         \n\
         Conversation history:\n\
         {history}\n\
         \n\
         Provide a well-organized summary:"
    );

    match generator
        .generate_text(&prompt, OVERVIEW_TEMPERATURE, OVERVIEW_MAX_TOKENS)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Overview generation failed: {e}");
            format!("{OVERVIEW_FAILED}: {e}")
        }
    }
}

/// Extract a numbered list of key facts from the live (non-system) messages.
///
/// Best effort: provider failures are logged and yield an empty list.
pub async fn key_facts(generator: &dyn TextGenerator, store: &MessageStore) -> Vec<String> {
    if store.is_empty() {
        return Vec::new();
    }

    let transcript = render_transcript(store.iter().filter(|m| !m.is_system()));
    let prompt = format!(
        "Extract key facts, information, and important details from this conversation.\n\
         List only concrete information, decisions, or important points.\n\
         Format as a numbered list.\n\
         \n\
         Conversation:\n\
         {transcript}\n\
         \n\
         Key facts:"
    );

    match generator
        .generate_text(&prompt, FACTS_TEMPERATURE, FACTS_MAX_TOKENS)
        .await
    {
        Ok(text) => parse_numbered_list(&text),
        Err(e) => {
            tracing::warn!("Fact extraction failed: {e}");
            Vec::new()
        }
    }
}

/// Classify the primary intent of a single user message.
///
/// The model answers `intent|confidence`. A bare label gets a confidence
/// of 0.5; a provider failure or an unreadable score yields
/// [`UNKNOWN_INTENT`] with zero confidence.
pub async fn classify_intent(generator: &dyn TextGenerator, message: &str) -> Intent {
    let prompt = format!(
        "Classify the user's intent from this message:\n\
         \n\
         Message: {message}\n\
         \n\
         Choose ONE primary intent from:\n\
         1. question - User is asking for information\n\
         2. command - User wants you to perform an action\n\
         3. statement - User is sharing information\n\
         4. clarification - User is clarifying previous message\n\
         5. feedback - User is providing feedback\n\
         6. casual - Casual conversation/greeting\n\
         \n\
         Respond with ONLY the intent category and confidence (0-1):\n\
         Format: intent|confidence"
    );

    match generator
        .generate_text(&prompt, INTENT_TEMPERATURE, INTENT_MAX_TOKENS)
        .await
    {
        Ok(text) => parse_intent(&text).unwrap_or_else(|| {
            tracing::warn!("Unreadable intent classification: {text:?}");
            Intent::unknown()
        }),
        Err(e) => {
            tracing::warn!("Intent classification failed: {e}");
            Intent::unknown()
        }
    }
}

fn parse_intent(text: &str) -> Option<Intent> {
    let text = text.trim();
    match text.split_once('|') {
        Some((label, confidence)) => Some(Intent {
            label: label.trim().to_string(),
            confidence: confidence.trim().parse().ok()?,
        }),
        None => Some(Intent {
            label: text.to_string(),
            confidence: UNSCORED_CONFIDENCE,
        }),
    }
}

/// Keep trimmed lines that look like list items (a digit in the first three chars).
fn parse_numbered_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().take(3).any(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}
