//! Conversation compaction: summarize the oldest messages and shrink the buffer.

use crate::store::MessageStore;
use crate::types::Counters;
use memoria_types::{Message, Summary, TextGenerator};
use std::sync::Arc;

/// Sampling temperature for summary generation.
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Output cap for a single summary.
const SUMMARY_MAX_TOKENS: u32 = 500;

/// Result of a compaction pass. Informational only; failures are absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// A summary was appended and `messages_removed` were dropped from the front.
    Compacted {
        batch_size: usize,
        messages_removed: usize,
    },
    /// Nothing to compact (empty batch).
    Skipped,
    /// The generator failed or returned no text; state is unchanged.
    Failed { reason: String },
}

impl CompactionOutcome {
    pub fn is_compacted(&self) -> bool {
        matches!(self, CompactionOutcome::Compacted { .. })
    }
}

/// Folds the oldest half of the buffer into a generated summary.
#[derive(Clone)]
pub struct SummarizationEngine {
    generator: Arc<dyn TextGenerator>,
    summary_threshold: usize,
}

impl SummarizationEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, summary_threshold: usize) -> Self {
        Self {
            generator,
            summary_threshold,
        }
    }

    /// Whether the buffer has reached the compaction threshold.
    pub fn is_due(&self, store: &MessageStore) -> bool {
        store.len() >= self.summary_threshold
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Run one compaction pass.
    ///
    /// The generator call completes before any state is touched, so a
    /// failed pass leaves `store`, `summaries` and `counters` exactly as
    /// they were. The next qualifying add retries.
    pub async fn compact(
        &self,
        store: &mut MessageStore,
        summaries: &mut Vec<Summary>,
        counters: &mut Counters,
    ) -> CompactionOutcome {
        let batch_size = store.len() / 2;
        if batch_size == 0 {
            return CompactionOutcome::Skipped;
        }

        let transcript = render_transcript(store.oldest(batch_size));
        let prompt = build_summary_prompt(&transcript);

        tracing::debug!(
            provider = self.generator.name(),
            batch_size,
            "Compacting conversation memory"
        );

        let text = match self
            .generator
            .generate_text(&prompt, SUMMARY_TEMPERATURE, SUMMARY_MAX_TOKENS)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Summarization failed: provider returned empty text");
                return CompactionOutcome::Failed {
                    reason: "empty summary".to_string(),
                };
            }
            Err(e) => {
                tracing::warn!("Summarization failed: {e}");
                return CompactionOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        summaries.push(Summary::new(text));
        counters.summary_count += 1;
        let messages_removed = store.drain_front(removal_count(batch_size, self.summary_threshold));

        tracing::debug!(
            messages_removed,
            remaining = store.len(),
            "Compaction complete"
        );

        CompactionOutcome::Compacted {
            batch_size,
            messages_removed,
        }
    }
}

/// How many summarized messages may leave the buffer: never more than half
/// the threshold window, even when the batch is larger.
pub fn removal_count(batch_size: usize, summary_threshold: usize) -> usize {
    batch_size.min(summary_threshold / 2)
}

/// Render messages as `ROLE: content` lines.
pub fn render_transcript<'a>(messages: impl IntoIterator<Item = &'a Message>) -> String {
    messages
        .into_iter()
        .map(Message::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the summarization prompt around a transcript.
fn build_summary_prompt(transcript: &str) -> String {
    format!(
        "Summarize the following conversation concisely, capturing:\n\
         1. Main topics discussed\n\
         2. Key information shared\n\
         3. Important decisions or conclusions\n\
         4. Any action items or unresolved questions\n\
         \n\
         Conversation:\n\
         {transcript}\n\
         \n\
         Provide a clear, structured summary:"
    )
}
