//! OpenAI-compatible chat completions client.

use std::time::Duration;

use memoria_types::{ContextEntry, ProviderError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;
use crate::stream::ChatStream;

/// A chat completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ContextEntry>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask for an SSE response. Set by [`ApiClient::complete_stream`].
    #[serde(skip_serializing_if = "is_false")]
    pub stream: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl ApiClient {
    /// Create a new API client with no request timeout.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::build(api_key.into(), base_url.into(), None)
    }

    /// Create a client whose requests fail with `Timeout` after `timeout`.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Self::build(api_key.into(), base_url.into(), Some(timeout))
    }

    fn build(api_key: String, base_url: String, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Set the retry configuration for transient errors (429, 5xx, network).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Send a chat completions request and return the first choice's text.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response = self.send(request).await?;
        let body_text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        parse_completion(&body_text)
    }

    /// Send a streaming chat completions request and return a stream of text deltas.
    ///
    /// Only the initial request is retried; errors mid-stream surface as
    /// stream items.
    pub async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, ProviderError> {
        let request = ChatRequest {
            stream: true,
            ..request.clone()
        };
        let response = self.send(&request).await?;
        Ok(ChatStream::new(response.bytes_stream()))
    }

    /// POST the request, retrying transient failures. Returns the first
    /// successful response with its body unread.
    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ProviderError::Auth {
                    message: "Invalid API key format".into(),
                }
            })?,
        );

        let body = serde_json::to_string(request).map_err(|e| ProviderError::BadRequest {
            message: format!("Failed to serialize request: {e}"),
        })?;

        let mut attempt = 0;
        loop {
            tracing::debug!(
                "POST {url} (attempt {}/{}, stream: {})",
                attempt + 1,
                self.retry_config.max_retries + 1,
                request.stream
            );

            let result = self
                .http
                .post(&url)
                .headers(headers.clone())
                .body(body.clone())
                .send()
                .await;

            let (err, retry_after) = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    let body_text = response.text().await.unwrap_or_default();
                    (classify_error(status.as_u16(), &body_text, retry_after), retry_after)
                }
                Err(e) if e.is_timeout() => (ProviderError::Timeout, None),
                Err(e) => (ProviderError::Network(e.to_string()), None),
            };

            if !err.is_retryable() || attempt >= self.retry_config.max_retries {
                return Err(err);
            }

            let delay = self.retry_config.delay_for(attempt, retry_after);
            tracing::warn!(
                "Retryable provider error (attempt {}/{}): {err}. Retrying in {delay}ms...",
                attempt + 1,
                self.retry_config.max_retries,
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }
}

/// Extract the first choice's text from a successful response body.
fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ProviderError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ProviderError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => ProviderError::Auth { message },
        400 | 404 | 422 => ProviderError::BadRequest { message },
        429 => ProviderError::RateLimited {
            retry_after_ms: retry_after,
        },
        503 | 529 => ProviderError::Overloaded,
        _ => ProviderError::Server { status, message },
    }
}
