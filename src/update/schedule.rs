use std::time::Duration;

/// Smallest accepted poll interval; a zero period would spin.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Largest accepted delay or interval (30 years); larger values overflow `Instant`.
const MAX_SPAN: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Fixed update-poll schedule: first check after `initial_delay`, then every `interval`.
///
/// Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSchedule {
    initial_delay: Duration,
    interval: Duration,
}

impl PollSchedule {
    /// Creates a schedule.
    ///
    /// `interval` is clamped to at least 1ms; both values are capped at 30 years.
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay: initial_delay.min(MAX_SPAN),
            interval: interval.clamp(MIN_INTERVAL, MAX_SPAN),
        }
    }

    /// Delay before the first check.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Period between checks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offset (from poller start) of the `n`-th check, 0-indexed.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use readyvisor::PollSchedule;
    ///
    /// let s = PollSchedule::new(Duration::from_secs(5), Duration::from_secs(300));
    /// assert_eq!(s.offset_of(0), Duration::from_secs(5));
    /// assert_eq!(s.offset_of(2), Duration::from_secs(605));
    /// ```
    pub fn offset_of(&self, n: u32) -> Duration {
        self.initial_delay
            .saturating_add(self.interval.saturating_mul(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_clamped() {
        let s = PollSchedule::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(s.interval(), MIN_INTERVAL);
    }

    #[test]
    fn huge_values_are_capped() {
        let s = PollSchedule::new(Duration::MAX, Duration::MAX);
        assert_eq!(s.initial_delay(), MAX_SPAN);
        assert_eq!(s.interval(), MAX_SPAN);
    }
}
