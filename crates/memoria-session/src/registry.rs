//! Explicit owner of live sessions, keyed by opaque ID.

use crate::error::SessionError;
use crate::session::MemorySession;
use crate::types::MemoryConfig;
use memoria_types::TextGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Map of live sessions. Callers own its lifetime; nothing here is global.
pub struct SessionRegistry {
    config: MemoryConfig,
    generator: Arc<dyn TextGenerator>,
    sessions: HashMap<Uuid, MemorySession>,
}

impl SessionRegistry {
    pub fn new(config: MemoryConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            generator,
            sessions: HashMap::new(),
        }
    }

    /// Start a session seeded with `system_prompt` and return its ID.
    pub fn create(&mut self, system_prompt: &str) -> Uuid {
        let id = Uuid::new_v4();
        let session =
            MemorySession::with_system_prompt(self.config, self.generator.clone(), system_prompt);
        self.sessions.insert(id, session);
        tracing::debug!(%id, "Created memory session");
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&MemorySession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut MemorySession> {
        self.sessions.get_mut(&id)
    }

    /// Like [`get_mut`](Self::get_mut) but errors on unknown IDs.
    pub fn require_mut(&mut self, id: Uuid) -> Result<&mut MemorySession, SessionError> {
        self.sessions
            .get_mut(&id)
            .ok_or(SessionError::NotFound { id })
    }

    /// Evict a session, handing it back to the caller.
    pub fn remove(&mut self, id: Uuid) -> Option<MemorySession> {
        let removed = self.sessions.remove(&id);
        if removed.is_some() {
            tracing::debug!(%id, "Removed memory session");
        }
        removed
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.sessions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
