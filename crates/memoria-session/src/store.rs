//! Capacity-bounded, insertion-ordered message buffer.

use memoria_types::Message;
use std::collections::VecDeque;

/// Ring buffer of messages for one session.
///
/// Pushing past `capacity` evicts the oldest message. Eviction is
/// independent of summarization.
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl MessageStore {
    /// Create an empty store. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a store from existing messages, keeping only the newest `capacity`.
    pub fn from_messages(capacity: usize, messages: Vec<Message>) -> Self {
        let mut store = Self::new(capacity);
        let skip = messages.len().saturating_sub(store.capacity);
        store.messages.extend(messages.into_iter().skip(skip));
        store
    }

    /// Append a message, returning the evicted oldest message on overflow.
    pub fn push(&mut self, message: Message) -> Option<Message> {
        self.messages.push_back(message);
        if self.messages.len() > self.capacity {
            self.messages.pop_front()
        } else {
            None
        }
    }

    /// Messages in insertion order. System messages are dropped unless
    /// `include_system`; then only the last `limit` are kept.
    pub fn get(&self, limit: Option<usize>, include_system: bool) -> Vec<&Message> {
        let filtered: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| include_system || !m.is_system())
            .collect();
        match limit {
            Some(n) => {
                let skip = filtered.len().saturating_sub(n);
                filtered.into_iter().skip(skip).collect()
            }
            None => filtered,
        }
    }

    /// The last `count` messages, system ones included.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Message> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip)
    }

    /// The oldest `count` messages.
    pub fn oldest(&self, count: usize) -> impl Iterator<Item = &Message> {
        self.messages.iter().take(count)
    }

    /// Remove up to `count` messages from the front, returning how many were removed.
    pub fn drain_front(&mut self, count: usize) -> usize {
        let n = count.min(self.messages.len());
        self.messages.drain(..n);
        n
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}
