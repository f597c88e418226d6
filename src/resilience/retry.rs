use std::future::Future;

use anyhow::Error;
use thiserror::Error as ThisError;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::config::settings::RetryConfig;
use crate::utils::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    pub attempts: u32,
    /// 0 retries back-to-back
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, ThisError)]
pub enum RetryError {
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: Error },
    #[error("cancelled")]
    Cancelled,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl From<&RetryConfig> for RetrySettings {
    fn from(config: &RetryConfig) -> Self {
        let defaults = RetrySettings::default();
        Self {
            attempts: config.attempts.unwrap_or(defaults.attempts),
            base_delay_ms: config.base_delay_ms.unwrap_or(defaults.base_delay_ms),
            max_delay_ms: config.max_delay_ms.unwrap_or(defaults.max_delay_ms),
        }
    }
}

impl RetrySettings {
    /// Run `operation` until it succeeds, `attempts` is used up, or `cancel` fires.
    ///
    /// Cancellation is checked before every attempt and also interrupts an
    /// in-flight attempt or a backoff sleep.
    pub async fn run_with_retry<F, Fut, T>(&self, cancel: &CancellationToken, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                outcome = operation(attempt) => outcome,
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    if delay > 0 {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                            _ = sleep(Duration::from_millis(delay)) => {}
                        }
                        delay = self.next_delay(delay);
                    }
                }
                Err(e) => {
                    error!("all {attempt} attempts failed: {e}");
                    return Err(RetryError::Exhausted { attempts, last: e });
                }
            }
        }
        unreachable!("Retry loop exhausted unexpectedly")
    }

    /// Doubled delay, capped at `max_delay_ms` (or `base_delay_ms` when that is larger).
    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms.max(self.base_delay_ms))
    }
}
