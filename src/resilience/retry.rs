//! Retry logic with exponential backoff.
//!
//! Re-runs a failing operation after `min(base * 2^attempt, max)` plus up to
//! 50% random jitter. Only errors the caller classifies as retryable are
//! retried; everything else is returned on the first occurrence.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retry budget and delay curve.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero means exactly one attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Add up to half the delay again at random
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_retries: config.retry_max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            jitter: true,
        }
    }

    /// Single attempt, no sleeping.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    // == Backoff ==
    /// Deterministic part of the delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Backoff plus jitter drawn from `[0, 0.5 * backoff)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let spread = rand::thread_rng().gen_range(0.0..0.5);
        delay + delay.mul_f64(spread)
    }
}

// == Retry ==
/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is exhausted. The last error is returned unchanged.
///
/// # Arguments
/// * `name` - Operation label used in log lines
/// * `policy` - Retry budget and delay curve
/// * `is_retryable` - Classifies errors worth another attempt
/// * `operation` - Produces a fresh future per attempt
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    name: &str,
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = name, retries = attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) if attempt >= policy.max_retries => {
                warn!(
                    operation = name,
                    attempts = attempt + 1,
                    error = %err,
                    "giving up after retries"
                );
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = name,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    ?delay,
                    error = %err,
                    "transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
