//! # Runtime events emitted by the registry, supervisor, poller and reporter.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Component events**: per-component init flow (registered, starting, ready, failed, backoff)
//! - **Startup events**: primary and late outcomes of the readiness race
//! - **Update events**: poller activity (probe, check succeeded/failed, disabled)
//! - **Runtime events**: reporter/subscriber faults and shutdown
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use readyvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ComponentFailed)
//!     .with_component("api")
//!     .with_reason("connection refused")
//!     .with_attempt(2)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::ComponentFailed);
//! assert_eq!(ev.component.as_deref(), Some("api"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `component` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `component` (subscriber name) and `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Component events ===
    /// Component added to the registry (construction order = `seq` order).
    ///
    /// Sets `component`.
    ComponentRegistered,

    /// Component init attempt is starting.
    ///
    /// Sets `component`, `attempt` (1-based).
    ComponentStarting,

    /// Component init attempt exceeded its per-attempt timeout.
    ///
    /// Sets `component`, `attempt`, `timeout_ms`.
    ComponentTimeoutHit,

    /// Component init attempt failed.
    ///
    /// Sets `component`, `attempt`, `reason`.
    ComponentFailed,

    /// Next init attempt scheduled after a retryable failure.
    ///
    /// Sets `component`, `attempt` (the failed one), `delay_ms`, `reason`.
    BackoffScheduled,

    /// Component token settled `Ready`.
    ///
    /// Sets `component`, `attempt`.
    ComponentReady,

    /// Component token settled `Failed` (terminal for this component).
    ///
    /// Sets `component`, `reason`.
    ComponentGaveUp,

    // === Startup events ===
    /// The readiness race began.
    ///
    /// Sets `timeout_ms` (deadline).
    StartupBegun,

    /// Primary outcome: every component ready before the deadline.
    StartupReady,

    /// Primary outcome: deadline elapsed first.
    ///
    /// Sets `timeout_ms` (deadline), `reason` (pending components).
    StartupTimedOut,

    /// Primary outcome: a component failed first.
    ///
    /// Sets `component`, `reason`.
    StartupFailed,

    /// Secondary: every component became ready after a timeout outcome.
    ///
    /// Sets `delay_ms` (elapsed since begin).
    StartupLateReady,

    /// Secondary: a component failed after a timeout outcome. Not reported to the sink.
    ///
    /// Sets `component`, `reason`.
    StartupLateFailed,

    // === Update events ===
    /// Capability probe succeeded; polling is active.
    UpdateRegistered,

    /// An update check completed.
    UpdateChecked,

    /// An update check failed or panicked; polling continues.
    ///
    /// Sets `reason`.
    UpdateCheckFailed,

    /// Update mechanism unavailable; polling permanently disabled.
    ///
    /// Sets `reason`.
    UpdateUnsupported,

    // === Runtime events ===
    /// A report was handed to the sink.
    ///
    /// Sets `reason` (report kind label).
    ReportSent,

    /// The report sink failed or panicked; the report was dropped.
    ///
    /// Sets `component` (sink name), `reason`.
    ReportSinkFailed,

    /// Shutdown requested (OS signal observed).
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Timeout or deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Delay (backoff or elapsed) in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Name of the component (or subscriber/sink), if applicable.
    pub component: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            attempt: None,
            timeout_ms: None,
            reason: None,
            delay_ms: None,
            component: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// Returns `true` for the three primary startup outcomes.
    #[inline]
    pub fn is_primary_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::StartupReady | EventKind::StartupTimedOut | EventKind::StartupFailed
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::StartupBegun);
        let b = Event::new(EventKind::StartupReady);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate_at_u32() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn primary_outcome_classification() {
        assert!(Event::new(EventKind::StartupTimedOut).is_primary_outcome());
        assert!(!Event::new(EventKind::StartupLateReady).is_primary_outcome());
    }
}
