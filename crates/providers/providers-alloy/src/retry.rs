//! Retry policy for transport failures.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Exponential backoff applied to failed RPC requests.
///
/// Only transport failures are retried. Error responses from the node, such as reverts, are
/// returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub const NONE: Self =
        Self { max_retries: 0, min_delay: Duration::ZERO, max_delay: Duration::ZERO };

    /// The [`backon`] backoff for this policy.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay.max(self.min_delay))
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}
