//! Bounded conversation memory with summarization and recall for Memoria.

pub mod compact;
pub mod context;
pub mod error;
pub mod insights;
pub mod registry;
pub mod search;
pub mod session;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use compact::{CompactionOutcome, SummarizationEngine};
pub use context::{SUMMARY_LABEL, assemble, estimate_tokens};
pub use error::SessionError;
pub use insights::Intent;
pub use registry::SessionRegistry;
pub use search::SearchHit;
pub use session::MemorySession;
pub use stats::{MemorySnapshot, MemoryStatistics};
pub use store::MessageStore;
pub use types::{Counters, MemoryConfig};
