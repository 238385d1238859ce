//! Exponential backoff for transient chat completion failures.

use super::client::ApiError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently to retry.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Spread concurrent sub-agents apart instead of retrying in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): doubles each time up
    /// to `max_delay`, then optionally shaved by a fixed cycle of factors.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let doubled = self
            .initial_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let delay = doubled.min(self.max_delay);
        if !self.jitter {
            return delay;
        }
        const FACTORS: [f64; 4] = [0.75, 0.9, 0.6, 0.85];
        delay.mul_f64(FACTORS[attempt as usize % FACTORS.len()])
    }
}

/// Await `call` again while it fails transiently and retries remain.
pub async fn retry_api_call<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Err(e) if attempt < config.max_retries && e.is_transient() => {
                let delay = config.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    "{e}; retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
