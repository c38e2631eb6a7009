//! Usage statistics and the portable snapshot format.

use crate::error::SessionError;
use crate::types::Counters;
use chrono::{DateTime, Utc};
use memoria_types::{Message, Summary};
use serde::{Deserialize, Serialize};

/// Point-in-time memory usage for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStatistics {
    pub total_messages: u64,
    pub current_messages: usize,
    pub summaries_created: u64,
    pub capacity: usize,
    /// Buffer fill as a percentage, rounded to one decimal place.
    pub utilization: f64,
    pub created_at: DateTime<Utc>,
}

impl MemoryStatistics {
    pub fn new(
        counters: Counters,
        current_messages: usize,
        capacity: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            total_messages: counters.total_message_count,
            current_messages,
            summaries_created: counters.summary_count,
            capacity,
            utilization: utilization_percent(current_messages, capacity),
            created_at,
        }
    }

    /// Utilization rendered like "12.0%".
    pub fn utilization_label(&self) -> String {
        format!("{:.1}%", self.utilization)
    }
}

fn utilization_percent(current: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let pct = current as f64 / capacity as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Self-contained export of a session's memory.
///
/// `messages`, `summaries` and `counters` are required on import;
/// `created_at` defaults to the import time. `statistics` is written on
/// export but never read back, whatever its shape. Unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub messages: Vec<Message>,
    pub summaries: Vec<Summary>,
    pub counters: Counters,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<MemoryStatistics>,
}

impl MemorySnapshot {
    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::Validation(e.to_string()))
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SessionError> {
        serde_json::from_value(value).map_err(|e| SessionError::Validation(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
