//! Retry and fallback strategy shared by every remote-facing stage.
//!
//! All three remote callers (rewrite, narration, synthesis) run through the
//! same combinator: a bounded retry loop with exponential backoff and a
//! per-attempt timeout, then a terminal local strategy. Keep this
//! deterministic and explainable; no adaptive heuristics.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Retry budget for one remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on a single attempt, enforced with `tokio::time::timeout`.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            min_delay,
            max_delay,
            attempt_timeout,
        }
    }

    pub fn rewrite_default() -> Self {
        Self::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(8),
            Duration::from_secs(30),
        )
    }

    pub fn tts_default() -> Self {
        Self::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(8),
            Duration::from_secs(30),
        )
    }

    pub fn narrator_default() -> Self {
        Self::new(
            2,
            Duration::from_secs(1),
            Duration::from_secs(8),
            Duration::from_secs(45),
        )
    }

    /// Exponential backoff: min_delay * 2^attempt, capped at max_delay.
    pub(crate) fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let base_ms = (self.min_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(base_ms.min(self.max_delay.as_millis() as u64))
    }
}

/// Run a fallible remote call under the policy's retry budget.
///
/// Returns the first success, or the last error once the budget is spent.
pub(crate) async fn call_with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err: Option<Error> = None;

    for attempt in 0..policy.max_attempts {
        let started = Instant::now();
        let outcome = match timeout(policy.attempt_timeout, attempt_fn()).await {
            Ok(result) => result,
            Err(_) => Err(Error::service(
                operation,
                format!(
                    "attempt timed out after {}ms",
                    policy.attempt_timeout.as_millis()
                ),
            )),
        };

        match outcome {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, attempt, "echocast remote call recovered");
                }
                return Ok(value);
            }
            Err(err) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "echocast remote call failed"
                );
                last_err = Some(err);
                if attempt + 1 < policy.max_attempts {
                    sleep(policy.backoff_delay(attempt)).await;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::service(operation, "retry budget is zero")))
}

/// Retry-then-fallback: try the remote strategy under the retry budget, then
/// hand over to the local strategy. An unconfigured service skips straight
/// to local without logging noise at warn level.
pub(crate) async fn remote_or_local<T, F, Fut, L>(
    policy: &RetryPolicy,
    operation: &'static str,
    configured: bool,
    remote: F,
    local: L,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    L: FnOnce() -> Result<T>,
{
    if !configured {
        debug!(
            operation,
            "echocast remote service not configured, using local strategy"
        );
        return local();
    }

    match call_with_retries(policy, operation, remote).await {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(
                operation,
                error = %err,
                "echocast remote attempts exhausted, falling back to local strategy"
            );
            local()
        }
    }
}
