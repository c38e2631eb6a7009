//! Session data types.

use serde::{Deserialize, Serialize};

/// Default hard capacity of the live message buffer.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default buffer length at which compaction becomes eligible.
pub const DEFAULT_SUMMARY_THRESHOLD: usize = 20;

/// Default number of recent messages included in an assembled context.
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Immutable memory limits, handed to each session at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Hard upper bound on live buffer length (FIFO eviction beyond it).
    pub capacity: usize,
    /// Buffer length at which a compaction pass runs.
    pub summary_threshold: usize,
    /// Recent raw messages to include when assembling context.
    pub recent_count: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            summary_threshold: DEFAULT_SUMMARY_THRESHOLD,
            recent_count: DEFAULT_RECENT_COUNT,
        }
    }
}

/// Lifetime counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Every message ever added, including evicted and compacted ones.
    pub total_message_count: u64,
    pub summary_count: u64,
}
