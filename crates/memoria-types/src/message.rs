//! Message types shared by the memory core and text-generation providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form per-message metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Lowercase wire name (e.g. "assistant").
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Uppercase label used in rendered transcripts (e.g. "USER").
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "SYSTEM",
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message retained in a session's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata to a freshly created message.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }

    /// Render as a transcript line: `ROLE: content`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// A compacted summary of older messages. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A `{role, content}` pair handed to a text-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
}

impl ContextEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Prepend `system_prompt` unless the first entry is already a system entry.
    pub fn ensure_system_prompt(entries: &mut Vec<ContextEntry>, system_prompt: &str) {
        let starts_with_system = entries
            .first()
            .is_some_and(|entry| entry.role == Role::System);
        if !starts_with_system {
            entries.insert(0, ContextEntry::new(Role::System, system_prompt));
        }
    }
}

impl From<&Message> for ContextEntry {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}
