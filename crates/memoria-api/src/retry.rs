//! Exponential backoff for provider requests.

use rand::Rng;

/// Configuration for retry behavior on transient provider errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom retry budget.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay in milliseconds before retrying after failed `attempt` (0-based).
    ///
    /// A server-provided `Retry-After` wins (clamped to `max_delay_ms`).
    /// Otherwise `initial_delay_ms * backoff_factor^attempt` with ±25%
    /// jitter, clamped to `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32, retry_after_ms: Option<u64>) -> u64 {
        if let Some(server_delay) = retry_after_ms {
            return server_delay.min(self.max_delay_ms);
        }

        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);
        let jittered = clamped * rand::rng().random_range(0.75..=1.25);

        (jittered as u64).min(self.max_delay_ms)
    }
}
