//! Scripted `TextGenerator` for unit tests.

use memoria_types::{GenerateFuture, ProviderError, TextGenerator};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded `generate_text` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Replays queued responses, falling back to "Summary N" when the queue is empty.
#[derive(Default)]
pub struct MockGenerator {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<String, ProviderError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TextGenerator for MockGenerator {
    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                temperature,
                max_output_tokens,
            });
            let n = calls.len();
            drop(calls);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("Summary {n}")))
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
