//! Retry Policy Module
//!
//! Attempt budget and exponential backoff schedule.

use std::time::Duration;

use crate::classify::ErrorCode;
use crate::error::{PerfError, Result};

// == Retry On ==
/// Which classified failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryOn {
    /// Retry every failure until attempts run out
    #[default]
    Always,
    /// Stop at the first permanent failure (auth, permission, not found)
    TransientOnly,
}

impl RetryOn {
    pub fn should_retry(&self, code: &ErrorCode) -> bool {
        match self {
            RetryOn::Always => true,
            RetryOn::TransientOnly => !code.is_permanent(),
        }
    }
}

// == Retry Policy ==
/// Attempt budget and backoff base for one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay: Duration,
    pub retry_on: RetryOn,
}

impl RetryPolicy {
    /// Creates a policy that retries every failure. `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            retry_on: RetryOn::Always,
        }
    }

    /// Creates a policy, rejecting a zero attempt budget.
    pub fn try_new(max_attempts: u32, base_delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(PerfError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self::new(max_attempts, base_delay))
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    // == Backoff ==
    /// Delay before retry `retry` (0 = first retry): `base_delay * 2^retry`.
    ///
    /// Saturates at `Duration::MAX` rather than overflowing.
    pub fn delay_for(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    /// Three attempts with a one second base delay.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
