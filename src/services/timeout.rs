//! Deadline wrapper around async operations.

use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{Error, Result};

/// Race an operation against a deadline.
///
/// Resolves to the operation's own result when it finishes in time, and to
/// [`Error::Timeout`] naming the operation otherwise. The timer is dropped
/// on every exit path, so no sleep outlives the call.
pub async fn with_timeout<T, F>(operation: &str, timeout_ms: u64, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
            timeout_ms,
        }),
    }
}
