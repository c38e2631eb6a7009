//! OpenAI-compatible chat completions client with SSE streaming for Memoria.

mod client;
mod provider;
mod retry;
mod sse;
mod stream;

pub use client::{ApiClient, ChatRequest};
pub use provider::OpenAiProvider;
pub use retry::RetryConfig;
pub use stream::ChatStream;
