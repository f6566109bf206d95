//! Automatic retries of transient checkout failures.

use std::time::Duration;

use rand::Rng;

use crate::config::ClientConfig;

/// Initial delay before the first automatic retry.
const BASE_DELAY: Duration = Duration::from_millis(500);
/// Upper bound for a single delay.
const MAX_DELAY: Duration = Duration::from_secs(8);

/// Exponential backoff with jitter.
///
/// Only transient failures are retried, and always with the attempt's
/// original idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Never retry automatically; the user decides.
    #[must_use]
    pub const fn manual() -> Self {
        Self {
            max_retries: 0,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.submit_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (starting at 1).
    ///
    /// Doubles each time up to `max_delay`; the result is drawn uniformly
    /// between half and all of that value.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let ceiling = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);
        let ceiling_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(ceiling_ms / 2..=ceiling_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let first = policy.delay_for(1);
            assert!(first >= Duration::from_millis(250) && first <= Duration::from_millis(500));

            let third = policy.delay_for(3);
            assert!(third >= Duration::from_millis(1000) && third <= Duration::from_millis(2000));

            let late = policy.delay_for(30);
            assert!(late <= MAX_DELAY);
            assert!(late >= MAX_DELAY / 2);
        }
    }

    #[test]
    fn test_zero_delay_policy() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        assert_eq!(policy.delay_for(2), Duration::ZERO);
    }

    #[test]
    fn test_manual_policy() {
        assert_eq!(RetryPolicy::manual().max_retries, 0);
    }
}
