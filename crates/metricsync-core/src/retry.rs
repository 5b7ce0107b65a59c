//! Fixed-delay retry policy shared by the analytics and destination clients.
//!
//! [`with_retry`] wraps any fallible async operation. The policy's classifier
//! decides which errors are transient; anything else is returned on the first
//! failure. Unlike an exponential back-off, every retry waits the same delay.

use std::future::Future;
use std::time::Duration;

/// Bounded fixed-delay retry policy with an error classifier.
pub struct RetryPolicy<E> {
    /// Total attempts, including the first. Values below one are treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub is_retryable: fn(&E) -> bool,
}

impl<E> RetryPolicy<E> {
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration, is_retryable: fn(&E) -> bool) -> Self {
        Self {
            max_attempts,
            delay,
            is_retryable,
        }
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for RetryPolicy<E> {}

impl<E> std::fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have been made.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once attempts are
/// exhausted.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy<E>,
    operation: &str,
    mut call: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !(policy.is_retryable)(&err) {
                    return Err(err);
                }
                if attempt >= max_attempts {
                    tracing::error!(
                        operation,
                        attempts = attempt,
                        error = %err,
                        "retries exhausted"
                    );
                    return Err(err);
                }
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = policy.delay.as_millis() as u64;
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transient error, retrying after fixed delay"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
