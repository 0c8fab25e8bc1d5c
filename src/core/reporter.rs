//! # Failure reporter: never-failing forwarder to the report sink.
//!
//! ```text
//! supervisor ──► FailureReporter::report(error, kind)
//!                     ├─► sink.send(&FailureReport)  ─ Ok ───► ReportSent
//!                     │                              ─ Err ──► ReportSinkFailed
//!                     │                              ─ panic ► ReportSinkFailed
//!                     └─► (no sink configured) ──────────────► nothing
//! ```
//!
//! ## Rules
//! - Stateless: every call is forwarded independently.
//! - `report` never returns an error and never unwinds into the caller.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;

use crate::error::StartupError;
use crate::events::{Bus, Event, EventKind};
use crate::reporting::{FailureReport, ReportKind, ReportSink};
use crate::subscribers::panic_message;

/// Forwards startup reports to an optional external sink.
pub struct FailureReporter {
    sink: Option<Arc<dyn ReportSink>>,
    bus: Bus,
}

impl FailureReporter {
    /// Creates a reporter; `None` discards reports (events still describe the outcome).
    pub fn new(sink: Option<Arc<dyn ReportSink>>, bus: Bus) -> Self {
        Self { sink, bus }
    }

    /// Builds a [`FailureReport`] and delivers it.
    pub async fn report(&self, error: StartupError, kind: ReportKind, elapsed: Duration) {
        let Some(sink) = &self.sink else {
            return;
        };
        let report = FailureReport {
            error,
            kind,
            at: SystemTime::now(),
            elapsed,
        };

        let delivered = std::panic::AssertUnwindSafe(sink.send(&report))
            .catch_unwind()
            .await;
        let failure = match delivered {
            Ok(Ok(())) => {
                self.bus
                    .publish(Event::new(EventKind::ReportSent).with_reason(kind.as_label()));
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic_err) => format!("sink panicked: {}", panic_message(panic_err.as_ref())),
        };
        self.bus.publish(
            Event::new(EventKind::ReportSinkFailed)
                .with_component(sink.name())
                .with_reason(format!("kind={} err={failure}", kind.as_label())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        got: Mutex<Vec<(ReportKind, String)>>,
    }

    #[async_trait]
    impl ReportSink for Collect {
        async fn send(&self, report: &FailureReport) -> Result<(), SinkError> {
            self.got
                .lock()
                .unwrap()
                .push((report.kind, report.error.as_label().to_string()));
            Ok(())
        }
    }

    struct Broken {
        panic: bool,
    }

    #[async_trait]
    impl ReportSink for Broken {
        async fn send(&self, _report: &FailureReport) -> Result<(), SinkError> {
            if self.panic {
                panic!("sink exploded");
            }
            Err(SinkError::Delivery {
                error: "503".into(),
            })
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn timeout_error() -> StartupError {
        StartupError::Timeout {
            deadline: Duration::from_secs(10),
            pending: vec!["events".into()],
        }
    }

    #[tokio::test]
    async fn forwards_report_with_kind() {
        let sink = Arc::new(Collect::default());
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let reporter = FailureReporter::new(Some(sink.clone()), bus);

        reporter
            .report(timeout_error(), ReportKind::Timeout, Duration::from_secs(10))
            .await;

        assert_eq!(
            *sink.got.lock().unwrap(),
            vec![(ReportKind::Timeout, "startup_timeout".to_string())]
        );
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ReportSent);
        assert_eq!(ev.reason.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn sink_errors_and_panics_are_swallowed() {
        for panic in [false, true] {
            let bus = Bus::new(8);
            let mut rx = bus.subscribe();
            let reporter = FailureReporter::new(Some(Arc::new(Broken { panic })), bus);

            reporter
                .report(timeout_error(), ReportKind::Failed, Duration::ZERO)
                .await;

            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.kind, EventKind::ReportSinkFailed);
            assert_eq!(ev.component.as_deref(), Some("broken"));
        }
    }

    #[tokio::test]
    async fn missing_sink_is_silent() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        FailureReporter::new(None, bus)
            .report(timeout_error(), ReportKind::Timeout, Duration::ZERO)
            .await;
        assert!(rx.try_recv().is_err());
    }
}
