//! CLI Configuration

use std::time::Duration;

use cartwright_app::domain::checkout::{CheckoutConfig, RetryConfig};
use clap::Args;

/// Database settings.
#[derive(Debug, Args)]
pub(crate) struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Checkout tuning.
#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Time limit for a single checkout attempt, in milliseconds
    #[arg(long, env = "CHECKOUT_TIMEOUT_MS", default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// Attempts made when storage fails transiently (at least 1)
    #[arg(
        long,
        env = "CHECKOUT_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, env = "CHECKOUT_RETRY_DELAY_MS", default_value_t = 50)]
    pub retry_delay_ms: u64,
}

impl CheckoutArgs {
    pub(crate) fn checkout_config(&self) -> CheckoutConfig {
        let defaults = RetryConfig::default();

        CheckoutConfig {
            transaction_timeout: Duration::from_millis(self.timeout_ms),
            retry: RetryConfig {
                max_attempts: self.max_attempts,
                initial_delay: Duration::from_millis(self.retry_delay_ms),
                ..defaults
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_args_override_timeout_and_retry() {
        let args = CheckoutArgs {
            timeout_ms: 250,
            max_attempts: 5,
            retry_delay_ms: 10,
        };

        let config = args.checkout_config();

        assert_eq!(config.transaction_timeout, Duration::from_millis(250));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(config.retry.max_delay, RetryConfig::default().max_delay);
    }
}
