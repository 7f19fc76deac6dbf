use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Bounds for capacity retries: total attempt ceiling and the fixed margin
/// added on top of the server-suggested wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            margin: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt ceiling is reached. Only capacity errors (which carry a
/// server-suggested wait) are retried; the wait is the hint plus the policy
/// margin. The last error is surfaced when attempts run out.
pub async fn retry_on_capacity<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => match err.retry_after() {
                Some(hint) if attempt < policy.max_attempts => {
                    let wait = hint + policy.margin;
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "Model over capacity, retrying after server-suggested wait"
                    );
                    tokio::time::sleep(wait).await;
                }
                _ => return Err(err),
            },
        }
    }
}
