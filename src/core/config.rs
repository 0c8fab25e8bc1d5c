//! # Launcher configuration.
//!
//! Provides [`LaunchConfig`], centralized settings for startup and update polling.
//!
//! Config is used in two ways:
//! 1. **Launcher creation**: `Launcher::builder(config)`
//! 2. **ComponentSpec defaults**: `ComponentSpec::with_defaults(component, &config)`
//!
//! ## Sentinel values
//! - `attempt_timeout = 0s` → no per-attempt timeout
//! - `attempts = 0` → treated as 1

use std::time::Duration;

use crate::policies::BackoffPolicy;
use crate::update::PollSchedule;

/// Global configuration for the launcher.
///
/// ## Field semantics
/// - `deadline`: Startup readiness deadline; after it the outcome is `TimedOut`
/// - `initial_poll_delay`: Delay before the first update check
/// - `poll_interval`: Fixed period between update checks
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `attempts`: Default init attempts per component
/// - `backoff`: Default delay policy between init attempts
/// - `attempt_timeout`: Default per-attempt init timeout (`0s` = none)
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    /// Time allowed for every component to become ready.
    ///
    /// Elapsing reports a timeout but never abandons the background wait.
    pub deadline: Duration,

    /// Delay before the first update check (keeps startup bandwidth free).
    pub initial_poll_delay: Duration,

    /// Period between update checks.
    pub poll_interval: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Default init attempts for [`ComponentSpec::with_defaults`](crate::ComponentSpec::with_defaults).
    pub attempts: u32,

    /// Default backoff between init attempts.
    pub backoff: BackoffPolicy,

    /// Default per-attempt timeout (`Duration::ZERO` = none).
    pub attempt_timeout: Duration,
}

impl LaunchConfig {
    /// Returns the default per-attempt timeout as an `Option`.
    #[inline]
    pub fn default_attempt_timeout(&self) -> Option<Duration> {
        if self.attempt_timeout == Duration::ZERO {
            None
        } else {
            Some(self.attempt_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the update poll schedule.
    #[inline]
    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::new(self.initial_poll_delay, self.poll_interval)
    }
}

impl Default for LaunchConfig {
    /// Default configuration:
    ///
    /// - `deadline = 10s`
    /// - `initial_poll_delay = 5s`
    /// - `poll_interval = 5min`
    /// - `bus_capacity = 1024`
    /// - `attempts = 1`, `backoff = BackoffPolicy::default()`, `attempt_timeout = 0s`
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
            initial_poll_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5 * 60),
            bus_capacity: 1024,
            attempts: 1,
            backoff: BackoffPolicy::default(),
            attempt_timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let cfg = LaunchConfig {
            bus_capacity: 0,
            ..LaunchConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.default_attempt_timeout(), None);

        let cfg = LaunchConfig {
            attempt_timeout: Duration::from_secs(3),
            ..cfg
        };
        assert_eq!(cfg.default_attempt_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn default_schedule_matches_update_cadence() {
        let schedule = LaunchConfig::default().poll_schedule();
        assert_eq!(schedule.initial_delay(), Duration::from_secs(5));
        assert_eq!(schedule.interval(), Duration::from_secs(300));
    }
}
