//! Bounded retry with exponential backoff for service-to-service calls.
//!
//! Only failures classified as transient are retried. The delay before
//! attempt `n` (1-based, counting retries) is `initial * 2^(n-1)` capped at
//! `max_backoff`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

/// Async sleep abstraction so tests can skip real delays.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Failure classification used by [`retry_with_backoff`].
pub trait Transient {
    /// Whether repeating the call may succeed.
    fn is_transient(&self) -> bool;
}

/// Retry limits for one outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Build a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Total attempts including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(retry.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent. The closure receives the 1-based attempt number.
///
/// # Errors
/// Returns the last error produced by `operation`.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    call: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Transient + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        debug!(call, attempt, "outbound call attempt");
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                let delay = policy.backoff(attempt);
                warn!(
                    call,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient outbound failure; retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    error!(call, attempt, error = %err, "outbound call failed after retries");
                }
                return Err(err);
            }
        }
    }
}
