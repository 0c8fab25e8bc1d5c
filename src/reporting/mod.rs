//! # Failure reports and the external sink they are forwarded to.
//!
//! The [`FailureReporter`](crate::FailureReporter) builds a [`FailureReport`] for
//! each terminal startup problem and hands it to a [`ReportSink`] (an error
//! tracker, a crash dashboard). Sinks may fail; the reporter absorbs that.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::error::{SinkError, StartupError};

/// Why a report was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// The startup deadline elapsed (the "is timeout" marker).
    Timeout,
    /// A component failed before the deadline.
    Failed,
    /// Startup completed after a timeout was already reported.
    LateSuccess,
}

impl ReportKind {
    /// Stable label: `timeout`, `failed` or `late-success`.
    pub fn as_label(&self) -> &'static str {
        match self {
            ReportKind::Timeout => "timeout",
            ReportKind::Failed => "failed",
            ReportKind::LateSuccess => "late-success",
        }
    }
}

/// One report delivered to a [`ReportSink`].
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// What went wrong (or, for late success, how late it was).
    pub error: StartupError,
    /// Report classification.
    pub kind: ReportKind,
    /// Wall-clock time the report was produced.
    pub at: SystemTime,
    /// Time since the readiness race began.
    pub elapsed: Duration,
}

/// External observability sink.
#[async_trait]
pub trait ReportSink: Send + Sync + 'static {
    /// Delivers one report.
    async fn send(&self, report: &FailureReport) -> Result<(), SinkError>;

    /// Sink name used in `ReportSinkFailed` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(ReportKind::Timeout.as_label(), "timeout");
        assert_eq!(ReportKind::Failed.as_label(), "failed");
        assert_eq!(ReportKind::LateSuccess.as_label(), "late-success");
    }
}
