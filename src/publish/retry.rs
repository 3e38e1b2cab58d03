//! Retry with exponential backoff for hosting calls.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::PublishError;

/// How often and how patiently to retry a failing publish.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    max_attempts: u32,

    /// Delay before the second attempt. Doubles on each further attempt.
    base_delay: Duration,

    /// Upper bound for a single delay.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, PublishError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PublishError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", op_name, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        op_name, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
