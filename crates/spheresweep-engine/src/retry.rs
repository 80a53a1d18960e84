//! Bounded retry with a fixed delay

use crate::settings::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use tokio::time::sleep;

/// Runs a fallible operation up to `max_attempts` times
///
/// Attempts are strictly sequential and separated by a constant delay. There
/// is no backoff and no jitter.
#[derive(Debug, Clone)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Invoke `op` until it succeeds or the attempt budget is spent
    ///
    /// Returns the first success, or the error of the last attempt.
    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    tracing::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    sleep(self.config.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
