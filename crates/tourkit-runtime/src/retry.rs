#![forbid(unsafe_code)]

//! Bounded retry policy for tooltip positioning.
//!
//! A target that exists but has not been laid out yet measures as absent or
//! zero-sized. The orchestrator re-measures it up to
//! [`RetryPolicy::max_attempts`] times, waiting [`RetryPolicy::delay`]
//! between attempts.
//!
//! # Determinism
//!
//! Backoff delays use fixed formulas (no jitter) so that scripted tests see
//! exact timing sequences.
//!
//! # Example
//!
//! ```
//! use tourkit_runtime::retry::{BackoffStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(4, BackoffStrategy::Exponential {
//!     base_ms: 100,
//!     max_ms: 250,
//! });
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! assert_eq!(policy.delay(2), Duration::from_millis(250));
//! // Three waits separate four attempts.
//! assert_eq!(policy.total_max_delay(), Duration::from_millis(550));
//! ```

use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "tour-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "tour-config",
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum BackoffStrategy {
    /// Fixed delay between attempts.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Exponential backoff: `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay cap in milliseconds.
        max_ms: u64,
    },
    /// Linear backoff: `base_ms * (attempt + 1)`, capped at `max_ms`.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay cap in milliseconds.
        max_ms: u64,
    },
}

/// How many times to measure, and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "tour-config", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Total measurement attempts in one positioning pass (including the first).
    pub max_attempts: u32,
    /// Wait between a failed attempt and the next.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// `max_attempts` attempts, `delay_ms` apart.
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self::new(max_attempts, BackoffStrategy::Fixed { delay_ms })
    }

    /// A single attempt.
    pub fn once() -> Self {
        Self::fixed(1, 0)
    }

    /// Wait after the given failed attempt (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                let delay = base_ms.saturating_mul(multiplier);
                Duration::from_millis(delay.min(*max_ms))
            }
            BackoffStrategy::Linear { base_ms, max_ms } => {
                let delay = base_ms.saturating_mul(u64::from(attempt) + 1);
                Duration::from_millis(delay.min(*max_ms))
            }
        }
    }

    /// Whether another attempt follows the given failed attempt.
    pub fn has_attempt_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }

    /// Worst-case time spent waiting in one pass.
    pub fn total_max_delay(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay(attempt))
            .sum()
    }
}

impl Default for RetryPolicy {
    /// 20 attempts, 100 ms apart.
    fn default() -> Self {
        Self::fixed(20, 100)
    }
}
