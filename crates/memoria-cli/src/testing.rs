//! Test doubles for the CLI.

use memoria_config::{CliOverrides, MemoriaConfig, SettingsFile};
use memoria_types::{ContextEntry, DeltaSink, GenerateFuture, ProviderError, TextGenerator};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// Resolved config with a dummy key and default limits.
pub fn test_config() -> MemoriaConfig {
    MemoriaConfig::resolve(
        CliOverrides {
            api_key: Some("sk-test".into()),
            ..CliOverrides::default()
        },
        SettingsFile::default(),
        PathBuf::from("."),
        |_| None,
    )
    .unwrap()
}

/// Replays canned replies in order; `failing()` errors on every call.
/// Streamed replies arrive one word at a time.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    fail: bool,
    chats: Mutex<Vec<Vec<ContextEntry>>>,
}

impl ScriptedGenerator {
    pub fn new<const N: usize>(replies: [&str; N]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fail: false,
            chats: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new([])
        }
    }

    /// Entries sent with the most recent `chat` call.
    pub fn last_chat(&self) -> Vec<ContextEntry> {
        self.chats.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn next_reply(&self) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Overloaded);
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ok".to_string()))
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate_text<'a>(
        &'a self,
        _prompt: &'a str,
        _temperature: f32,
        _max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move { self.next_reply() })
    }

    fn chat<'a>(
        &'a self,
        entries: &'a [ContextEntry],
        _temperature: f32,
        _max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            self.chats.lock().unwrap().push(entries.to_vec());
            self.next_reply()
        })
    }

    fn chat_stream<'a>(
        &'a self,
        entries: &'a [ContextEntry],
        temperature: f32,
        max_output_tokens: u32,
        on_delta: DeltaSink<'a>,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let reply = self.chat(entries, temperature, max_output_tokens).await?;
            for word in reply.split_inclusive(' ') {
                on_delta(word);
            }
            Ok(reply)
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
