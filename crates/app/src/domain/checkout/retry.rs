//! Exponential backoff for transient failures.

use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// A single attempt with no retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay.saturating_mul(self.multiplier).min(self.max_delay)
    }
}

/// Whether an error is worth retrying.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

/// Run `operation` until it succeeds, fails permanently or runs out of
/// attempts. `operation` receives the 1-based attempt number.
pub async fn retry_on_transient<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay.min(config.max_delay);

    loop {
        attempt += 1;

        debug!(attempt, max_attempts = config.max_attempts, "attempting operation");

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "operation succeeded after retry");
                }

                return Ok(value);
            }
            Err(error) if !error.is_transient() => return Err(error),
            Err(error) if attempt >= config.max_attempts => {
                error!(attempt, error = %error, "operation failed after all retries");

                return Err(error);
            }
            Err(error) => {
                warn!(
                    attempt,
                    error = %error,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient failure, retrying after delay"
                );

                sleep(delay).await;

                delay = config.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("transient")]
        Transient,

        #[error("permanent")]
        Permanent,
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);

        let result = retry_on_transient(&fast(3), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);

            async move {
                if attempt < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert!(matches!(result, Ok(3)), "expected Ok(3), got {result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_on_transient(&fast(2), |_| {
            calls.fetch_add(1, Ordering::SeqCst);

            async { Err(TestError::Transient) }
        })
        .await;

        assert!(
            matches!(result, Err(TestError::Transient)),
            "expected Transient, got {result:?}"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_on_transient(&fast(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);

            async { Err(TestError::Permanent) }
        })
        .await;

        assert!(
            matches!(result, Err(TestError::Permanent)),
            "expected Permanent, got {result:?}"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let config = RetryConfig::default();

        assert_eq!(
            config.next_delay(Duration::from_millis(50)),
            Duration::from_millis(100)
        );
        assert_eq!(
            config.next_delay(Duration::from_millis(800)),
            Duration::from_secs(1)
        );
    }
}
