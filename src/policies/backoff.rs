//! # Backoff policy for component init retries.
//!
//! The delay before retry `n` (0-indexed) is `first × factor^n`, clamped to `max`,
//! then jittered. The base never depends on a previous jittered value.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use readyvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
//! assert_eq!(backoff.delay_for(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied on top of the clamped base.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 100ms`, `factor = 2.0`, `max = 5s`, no jitter.
    ///
    /// Startup deadlines are short, so the cap is kept well below them.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay, no growth, no jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially_until_cap() {
        let policy = exp(100, 1_000);
        let delays: Vec<u128> = (0..6).map(|n| policy.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
    }

    #[test]
    fn first_above_max_is_clamped() {
        assert_eq!(exp(10_000, 5_000).delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn overflowing_exponent_clamps_to_max() {
        assert_eq!(exp(100, 10_000).delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn constant_never_changes() {
        let policy = BackoffPolicy::constant(Duration::from_millis(250));
        for n in 0..20 {
            assert_eq!(policy.delay_for(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn jitter_never_exceeds_base() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..exp(100, 30_000)
        };
        for n in 0..12 {
            let base = exp(100, 30_000).delay_for(n);
            let d = policy.delay_for(n);
            assert!(d <= base && d >= base / 2, "retry {n}: {d:?} vs {base:?}");
        }
    }
}
