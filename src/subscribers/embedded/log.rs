//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//!
//! ## Example output
//! ```text
//! [registered] component="accounts"
//! [starting] component="api" attempt=1
//! [failed] component="api" err="connection refused" attempt=1
//! [backoff] component="api" delay_ms=200 after_attempt=1 err="connection refused"
//! [ready] component="api" attempt=2
//! [startup-timed-out] deadline_ms=10000 pending="events"
//! [startup-late-ready] elapsed_ms=12750
//! [update-unsupported] reason="no update worker"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let component = e.component.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ComponentRegistered => {
                println!("[registered] component={component:?}");
            }
            EventKind::ComponentStarting => {
                println!("[starting] component={component:?} attempt={:?}", e.attempt);
            }
            EventKind::ComponentTimeoutHit => {
                println!(
                    "[attempt-timeout] component={component:?} timeout_ms={:?}",
                    e.timeout_ms
                );
            }
            EventKind::ComponentFailed => {
                println!(
                    "[failed] component={component:?} err={reason:?} attempt={:?}",
                    e.attempt
                );
            }
            EventKind::BackoffScheduled => {
                println!(
                    "[backoff] component={component:?} delay_ms={:?} after_attempt={:?} err={reason:?}",
                    e.delay_ms, e.attempt
                );
            }
            EventKind::ComponentReady => {
                println!("[ready] component={component:?} attempt={:?}", e.attempt);
            }
            EventKind::ComponentGaveUp => {
                println!("[gave-up] component={component:?} err={reason:?}");
            }
            EventKind::StartupBegun => {
                println!("[startup-begun] deadline_ms={:?}", e.timeout_ms);
            }
            EventKind::StartupReady => println!("[startup-ready]"),
            EventKind::StartupTimedOut => {
                println!(
                    "[startup-timed-out] deadline_ms={:?} pending={reason:?}",
                    e.timeout_ms
                );
            }
            EventKind::StartupFailed => {
                println!("[startup-failed] component={component:?} err={reason:?}");
            }
            EventKind::StartupLateReady => {
                println!("[startup-late-ready] elapsed_ms={:?}", e.delay_ms);
            }
            EventKind::StartupLateFailed => {
                println!("[startup-late-failed] component={component:?} err={reason:?}");
            }
            EventKind::UpdateRegistered => println!("[update-registered]"),
            EventKind::UpdateChecked => println!("[update-checked]"),
            EventKind::UpdateCheckFailed => {
                println!("[update-check-failed] err={reason:?}");
            }
            EventKind::UpdateUnsupported => {
                println!("[update-unsupported] reason={reason:?}");
            }
            EventKind::ReportSent => println!("[report-sent] kind={reason}"),
            EventKind::ReportSinkFailed => {
                println!("[report-sink-failed] sink={component} err={reason:?}");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={component} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={component} info={reason}");
            }
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
