//! Retry with exponential backoff for transient network failures.

use std::time::Duration;
use tokio::time::sleep;

use crate::error::CrawlError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry configuration tuned for the arXiv endpoints, which throttle
/// aggressive clients.
pub fn api_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(20),
        backoff_multiplier: 2.0,
    }
}

/// Execute an async operation, retrying transient failures with backoff.
///
/// Only [`CrawlError::Network`] is considered transient; `NotFound`,
/// `Parse` and `Validation` errors return immediately.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, CrawlError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CrawlError>>,
{
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) if error.is_transient() && attempt < config.max_attempts => {
                tracing::debug!(attempt, %error, delay_ms = delay.as_millis() as u64, "transient error, retrying");
                sleep(delay).await;
                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn succeeds_first_try_without_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retry(quick_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CrawlError>("ok") }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(quick_config(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CrawlError::Network("flaky".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_do_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(quick_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CrawlError::NotFound("gone".into())) }
        })
        .await;
        assert!(matches!(result, Err(CrawlError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(quick_config(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CrawlError::Network("down".into())) }
        })
        .await;
        assert!(matches!(result, Err(CrawlError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
