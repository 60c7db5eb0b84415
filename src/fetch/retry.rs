//! Retry policy with capped exponential backoff and random jitter

use crate::config::FetcherConfig;
use rand::Rng;
use std::time::Duration;

/// How many times a request is attempted and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt, doubled for every further attempt
    pub base_delay: Duration,

    /// Ceiling of the exponential part of the delay
    pub max_delay: Duration,

    /// Upper bound of the uniform random jitter added on top
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_cap_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// A policy with no waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the wait after the given failed attempt (1-based):
    /// `min(cap, base * 2^(attempt - 1))`
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Full wait after the given failed attempt, jitter included
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.exponential_delay(attempt)
            .saturating_add(Duration::from_millis(jitter))
    }
}
