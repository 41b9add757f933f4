//! Retry policy with exponential backoff for rewrite API requests.
//!
//! Independent of the login backoff policy: this one guards HTTP calls to
//! the model API, where only transient failures (throttling, 5xx, network
//! errors) are worth retrying.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

/// API failure split the retry loop decides on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Worth retrying: 429/5xx/overloaded, network errors.
    #[error("transient API error: {0}")]
    Transient(String),

    /// Not worth retrying: auth failures, malformed requests.
    #[error("permanent API error: {0}")]
    Permanent(String),
}

/// Exponential-backoff retry for transient errors only.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Run the operation, retrying transient failures with doubling
    /// backoff. Permanent failures and exhaustion return the last error.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut backoff_ms = self.initial_backoff_ms;
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err @ ApiError::Permanent(_)) => return Err(err),
                Err(err @ ApiError::Transient(_)) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    warn!(attempt, backoff_ms, error = %err, "transient API error, retrying");
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(self.max_backoff_ms);
                    attempt += 1;
                }
            }
        }
    }
}
