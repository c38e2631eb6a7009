//! `TextGenerator` implementation over the chat completions client.

use crate::client::{ApiClient, ChatRequest};
use crate::retry::RetryConfig;
use futures_util::StreamExt;
use memoria_types::{ContextEntry, DeltaSink, GenerateFuture, ProviderError, Role, TextGenerator};

/// OpenAI-compatible text-generation provider bound to one model.
///
/// Retry logic stays in `ApiClient`.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: ApiClient,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
            model: model.into(),
        })
    }

    /// Wrap an already-configured client.
    pub fn from_client(client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(config);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ContextEntry>, temperature: f32, max_tokens: u32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
            stream: false,
        }
    }
}

impl TextGenerator for OpenAiProvider {
    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let request = self.request(
                vec![ContextEntry::new(Role::User, prompt)],
                temperature,
                max_output_tokens,
            );
            self.client.complete(&request).await
        })
    }

    fn chat<'a>(
        &'a self,
        entries: &'a [ContextEntry],
        temperature: f32,
        max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let request = self.request(entries.to_vec(), temperature, max_output_tokens);
            self.client.complete(&request).await
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
            let request = self.request(entries.to_vec(), temperature, max_output_tokens);
            let mut stream = self.client.complete_stream(&request).await?;

            let mut reply = String::new();
            while let Some(delta) = stream.next().await {
                let delta = delta?;
                on_delta(&delta);
                reply.push_str(&delta);
            }
            Ok(reply)
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
