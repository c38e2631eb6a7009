//! One conversation's memory: bounded buffer, summaries and counters.

use crate::compact::{CompactionOutcome, SummarizationEngine};
use crate::context;
use crate::error::SessionError;
use crate::insights::{self, Intent};
use crate::search::{self, SearchHit};
use crate::stats::{MemorySnapshot, MemoryStatistics};
use crate::store::MessageStore;
use crate::types::{Counters, MemoryConfig};
use chrono::{DateTime, Utc};
use memoria_types::{ContextEntry, Message, Metadata, Role, Summary, TextGenerator};
use std::sync::Arc;

/// Memory state for a single session.
///
/// All mutation goes through `&mut self`: [`add`](Self::add),
/// [`compact_now`](Self::compact_now), [`clear`](Self::clear) and
/// [`import`](Self::import).
pub struct MemorySession {
    config: MemoryConfig,
    store: MessageStore,
    summaries: Vec<Summary>,
    counters: Counters,
    created_at: DateTime<Utc>,
    engine: SummarizationEngine,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new(config: MemoryConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store: MessageStore::new(config.capacity),
            summaries: Vec::new(),
            counters: Counters::default(),
            created_at: Utc::now(),
            engine: SummarizationEngine::new(generator, config.summary_threshold),
            config,
        }
    }

    /// Create a session seeded with its behavior prompt as the first system message.
    pub fn with_system_prompt(
        config: MemoryConfig,
        generator: Arc<dyn TextGenerator>,
        system_prompt: &str,
    ) -> Self {
        let mut session = Self::new(config, generator);
        session.record(Message::new(Role::System, system_prompt));
        session
    }

    /// Append a message, then run one compaction pass if the buffer reached
    /// the threshold. Returns the compaction outcome when a pass ran.
    pub async fn add(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Option<CompactionOutcome> {
        let mut message = Message::new(role, content);
        if let Some(metadata) = metadata {
            message = message.with_metadata(metadata);
        }
        self.record(message);

        if self.engine.is_due(&self.store) {
            Some(self.compact_now().await)
        } else {
            None
        }
    }

    fn record(&mut self, message: Message) {
        if let Some(evicted) = self.store.push(message) {
            tracing::debug!(role = %evicted.role, "Evicted oldest message at capacity");
        }
        self.counters.total_message_count += 1;
    }

    /// Run a compaction pass now, regardless of the threshold.
    pub async fn compact_now(&mut self) -> CompactionOutcome {
        self.engine
            .compact(&mut self.store, &mut self.summaries, &mut self.counters)
            .await
    }

    /// Stored messages in insertion order (see [`MessageStore::get`]).
    pub fn messages(&self, limit: Option<usize>, include_system: bool) -> Vec<&Message> {
        self.store.get(limit, include_system)
    }

    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Context entries for the next turn (see [`context::assemble`]).
    pub fn assemble_context(&self, include_summaries: bool, recent_count: usize) -> Vec<ContextEntry> {
        context::assemble(&self.store, &self.summaries, include_summaries, recent_count)
    }

    /// Keyword search over non-system messages.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit<'_>> {
        search::search(&self.store, query, top_k)
    }

    /// Empty the buffer and summaries and zero the counters.
    ///
    /// The behavior prompt is not re-seeded; that is up to the caller.
    pub fn clear(&mut self) {
        self.store.clear();
        self.summaries.clear();
        self.counters = Counters::default();
        self.created_at = Utc::now();
    }

    pub fn statistics(&self) -> MemoryStatistics {
        MemoryStatistics::new(
            self.counters,
            self.store.len(),
            self.store.capacity(),
            self.created_at,
        )
    }

    /// Full, self-contained snapshot of this session's memory.
    pub fn export(&self) -> MemorySnapshot {
        MemorySnapshot {
            messages: self.store.to_vec(),
            summaries: self.summaries.clone(),
            counters: self.counters,
            created_at: self.created_at,
            statistics: Some(self.statistics()),
        }
    }

    /// Replace all state from a snapshot. Messages beyond capacity are
    /// dropped oldest-first.
    pub fn import(&mut self, snapshot: MemorySnapshot) {
        let dropped = snapshot
            .messages
            .len()
            .saturating_sub(self.store.capacity());
        if dropped > 0 {
            tracing::debug!(dropped, "Imported snapshot exceeds capacity");
        }
        self.store = MessageStore::from_messages(self.config.capacity, snapshot.messages);
        self.summaries = snapshot.summaries;
        self.counters = snapshot.counters;
        self.created_at = snapshot.created_at;
    }

    /// Validate a JSON snapshot and replace all state with it.
    ///
    /// On a validation error the session is left unchanged.
    pub fn import_json(&mut self, json: &str) -> Result<(), SessionError> {
        let snapshot = MemorySnapshot::from_json(json)?;
        self.import(snapshot);
        Ok(())
    }

    /// Like [`import_json`](Self::import_json) for an already-parsed value.
    pub fn import_value(&mut self, value: serde_json::Value) -> Result<(), SessionError> {
        let snapshot = MemorySnapshot::from_value(value)?;
        self.import(snapshot);
        Ok(())
    }

    /// Comprehensive summary of the whole conversation. Generation
    /// failures come back as an error description rather than an `Err`.
    pub async fn overview(&self) -> String {
        insights::overview(self.engine.generator().as_ref(), &self.store, &self.summaries).await
    }

    /// Numbered key facts from the live messages. Empty on failure.
    pub async fn key_facts(&self) -> Vec<String> {
        insights::key_facts(self.engine.generator().as_ref(), &self.store).await
    }

    /// Primary intent of `message`. Does not touch memory.
    pub async fn classify_intent(&self, message: &str) -> Intent {
        insights::classify_intent(self.engine.generator().as_ref(), message).await
    }
}
