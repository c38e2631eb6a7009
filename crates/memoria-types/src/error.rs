//! Error hierarchy for Memoria.

use thiserror::Error;

/// Errors from a text-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server overloaded")]
    Overloaded,

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    /// Returns `true` if the error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Overloaded
                | ProviderError::Server { .. }
                | ProviderError::Network(_)
                | ProviderError::Timeout
        )
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
