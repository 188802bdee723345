//! Retry/backoff helper for transient RPC failures.
//!
//! Same escalating-multiplier shape as the route cooldown in
//! `arbitrage::cooldown` (`initial * FACTOR^(attempt-1)`), applied here to
//! a single call instead of a whole route.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::CoreError;

const BACKOFF_FACTOR: u32 = 3;

pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub per_call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(200),
            per_call_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs `op` up to `policy.attempts` times, each attempt bounded by
/// `policy.per_call_timeout`. Returns the last error if every attempt fails.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let call = op();
        let outcome = tokio::time::timeout(policy.per_call_timeout, call).await;
        match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if attempt >= policy.attempts => return Err(err),
            Ok(Err(err)) => {
                warn!(label, attempt, error = %err, "retrying after call failure");
            }
            Err(_) if attempt >= policy.attempts => {
                return Err(CoreError::Timeout {
                    elapsed_ms: policy.per_call_timeout.as_millis() as u64,
                });
            }
            Err(_) => {
                warn!(label, attempt, "retrying after timeout");
            }
        }
        let backoff = policy.initial_backoff * BACKOFF_FACTOR.pow(attempt - 1);
        tokio::time::sleep(backoff).await;
    }
}
