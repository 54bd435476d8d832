//! Checkout configuration.

use std::time::Duration;

use crate::domain::checkout::retry::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Upper bound for a single attempt, from `begin` to `commit`.
    pub transaction_timeout: Duration,
    /// Retry policy for transient infrastructure failures.
    pub retry: RetryConfig,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}
