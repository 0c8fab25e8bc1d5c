//! # Startup supervisor: aggregate readiness raced against a deadline.
//!
//! ## Flow
//! ```text
//! await_all(tokens, deadline)
//!   ├─► publish StartupBegun
//!   ├─► aggregate = try_join_all(token.settled())      first failure wins,
//!   │                                                   other components keep running
//!   └─► select! (biased: aggregate polled first)
//!         ├─ aggregate Ok   ─► primary Ready    ─► on_ready() once
//!         ├─ aggregate Err  ─► primary Failed   ─► report(failed)
//!         └─ deadline       ─► primary TimedOut ─► report(timeout)
//!                               └─► spawn background: aggregate (same future, not restarted)
//!                                     ├─ Ok  ─► StartupLateReady ─► on_ready() once
//!                                     │                          ─► report(late-success)
//!                                     └─ Err ─► StartupLateFailed (event only)
//! ```
//!
//! ## Rules
//! - Exactly one primary outcome per supervisor: a second `await_all` (even one
//!   arriving mid-race) waits for and returns the first outcome without racing again.
//! - Reports and the background wait run on a [`TaskTracker`]; [`StartupSupervisor::drain`]
//!   waits for them, so a slow sink still receives its report before shutdown.
//! - The ready consumer is an `FnOnce` taken out of a mutex; it runs at most once
//!   over the supervisor's lifetime, whether readiness came in time or late.
//! - The background wait ends only when the aggregate settles or the runtime token
//!   is cancelled (launcher shutdown).
//! - Ties (aggregate and deadline ready in the same poll) go to the aggregate. A
//!   settlement made by another task woken at the deadline instant is not visible
//!   in that poll; it lands as a late success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use futures::future::{BoxFuture, try_join_all};
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::components::{Readiness, ReadinessToken};
use crate::core::reporter::FailureReporter;
use crate::error::StartupError;
use crate::events::{Bus, Event, EventKind};
use crate::reporting::ReportKind;

/// Ready consumer, invoked at most once.
pub type ReadyHandler = Box<dyn FnOnce() + Send + 'static>;

/// Primary result of the readiness race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Every component became ready before the deadline.
    Ready,
    /// The deadline elapsed first; the aggregate is still awaited in the background.
    TimedOut {
        /// The configured deadline.
        deadline: Duration,
        /// Components still pending at the deadline (registration order).
        pending: Vec<String>,
    },
    /// A component failed before the deadline.
    Failed(StartupError),
}

impl StartupOutcome {
    /// Returns `true` for [`StartupOutcome::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, StartupOutcome::Ready)
    }

    /// Short stable label: `ready`, `timed_out` or `failed`.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupOutcome::Ready => "ready",
            StartupOutcome::TimedOut { .. } => "timed_out",
            StartupOutcome::Failed(_) => "failed",
        }
    }

    /// The error describing a non-ready outcome.
    pub fn error(&self) -> Option<StartupError> {
        match self {
            StartupOutcome::Ready => None,
            StartupOutcome::TimedOut { deadline, pending } => Some(StartupError::Timeout {
                deadline: *deadline,
                pending: pending.clone(),
            }),
            StartupOutcome::Failed(err) => Some(err.clone()),
        }
    }
}

/// What a consumer should display right now.
///
/// Unlike [`StartupOutcome`] this may change once: from `Failed` to `Ready` when
/// startup recovers in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupStatus {
    /// The race has not produced a primary outcome yet.
    Starting,
    /// Every component is ready.
    Ready,
    /// Startup timed out or failed; recovery may still happen in the background.
    Failed(StartupError),
}

/// Races aggregate component readiness against a deadline.
pub struct StartupSupervisor {
    bus: Bus,
    reporter: Arc<FailureReporter>,
    on_ready: Mutex<Option<ReadyHandler>>,
    begun: AtomicBool,
    primary: OnceLock<StartupOutcome>,
    status: watch::Sender<StartupStatus>,
    runtime_token: CancellationToken,
    tasks: TaskTracker,
}

impl StartupSupervisor {
    /// Creates a supervisor.
    ///
    /// `runtime_token` bounds the background wait after a timeout.
    pub fn new(
        bus: Bus,
        reporter: Arc<FailureReporter>,
        on_ready: Option<ReadyHandler>,
        runtime_token: CancellationToken,
    ) -> Arc<Self> {
        let (status, _rx) = watch::channel(StartupStatus::Starting);
        Arc::new(Self {
            bus,
            reporter,
            on_ready: Mutex::new(on_ready),
            begun: AtomicBool::new(false),
            primary: OnceLock::new(),
            status,
            runtime_token,
            tasks: TaskTracker::new(),
        })
    }

    /// Primary outcome, once produced.
    pub fn outcome(&self) -> Option<StartupOutcome> {
        self.primary.get().cloned()
    }

    /// Watches the displayable status (`Starting` → `Ready` | `Failed` → `Ready`).
    pub fn watch(&self) -> watch::Receiver<StartupStatus> {
        self.status.subscribe()
    }

    /// Waits for every token to settle `Ready`, the first failure, or the deadline.
    ///
    /// Must be called inside a tokio runtime (a timeout spawns the background wait).
    pub async fn await_all(
        self: &Arc<Self>,
        tokens: Vec<ReadinessToken>,
        deadline: Duration,
    ) -> StartupOutcome {
        if self.begun.swap(true, Ordering::AcqRel) {
            return self.wait_primary().await;
        }

        let started = Instant::now();
        self.bus
            .publish(Event::new(EventKind::StartupBegun).with_timeout(deadline));

        let observed = tokens.clone();
        let mut aggregate = aggregate(tokens);
        let raced = tokio::select! {
            biased;
            res = &mut aggregate => Some(res),
            _ = time::sleep(deadline) => None,
        };

        let outcome = match raced {
            Some(Ok(())) => StartupOutcome::Ready,
            Some(Err(err)) => StartupOutcome::Failed(err),
            None => StartupOutcome::TimedOut {
                deadline,
                pending: pending_names(&observed),
            },
        };

        // No await between the check and the set: exactly one primary outcome.
        if self.primary.set(outcome.clone()).is_err() {
            return self.outcome().unwrap_or(outcome);
        }

        match &outcome {
            StartupOutcome::Ready => {
                self.bus.publish(Event::new(EventKind::StartupReady));
                self.mark_ready();
            }
            StartupOutcome::Failed(err) => {
                self.publish_failed(EventKind::StartupFailed, err);
                self.status.send_replace(StartupStatus::Failed(err.clone()));
                self.spawn_report(err.clone(), ReportKind::Failed, started.elapsed());
            }
            StartupOutcome::TimedOut { deadline, pending } => {
                let err = StartupError::Timeout {
                    deadline: *deadline,
                    pending: pending.clone(),
                };
                self.bus.publish(
                    Event::new(EventKind::StartupTimedOut)
                        .with_timeout(*deadline)
                        .with_reason(pending.join(",")),
                );
                self.status.send_replace(StartupStatus::Failed(err.clone()));
                self.spawn_report(err, ReportKind::Timeout, started.elapsed());
                self.spawn_background_wait(aggregate, *deadline, started);
            }
        }
        outcome
    }

    /// Waits for reports and the background wait to finish.
    ///
    /// Cancel the runtime token first, otherwise a never-settling component keeps
    /// the background wait alive.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Returns the primary outcome produced by the `await_all` call that raced.
    async fn wait_primary(&self) -> StartupOutcome {
        // Subscribe before checking: the status is sent after the outcome is set.
        let mut rx = self.status.subscribe();
        loop {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            // The sender lives in `self`, so this only returns on a new status.
            let _ = rx.changed().await;
        }
    }

    /// Keeps observing the aggregate after a timeout and emits secondary notifications.
    fn spawn_background_wait(
        self: &Arc<Self>,
        aggregate: BoxFuture<'static, Result<(), StartupError>>,
        deadline: Duration,
        started: Instant,
    ) {
        let me = Arc::clone(self);
        self.tasks.spawn(async move {
            let res = tokio::select! {
                res = aggregate => res,
                _ = me.runtime_token.cancelled() => return,
            };
            match res {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    me.bus
                        .publish(Event::new(EventKind::StartupLateReady).with_delay(elapsed));
                    me.mark_ready();
                    me.reporter
                        .report(
                            StartupError::InitializedLate { deadline, elapsed },
                            ReportKind::LateSuccess,
                            elapsed,
                        )
                        .await;
                }
                Err(err) => {
                    // Already reported as a timeout; no second report.
                    me.publish_failed(EventKind::StartupLateFailed, &err);
                    me.status.send_replace(StartupStatus::Failed(err));
                }
            }
        });
    }

    /// Switches status to `Ready` and runs the ready consumer if it has not run yet.
    fn mark_ready(&self) {
        self.status.send_replace(StartupStatus::Ready);
        let handler = match self.on_ready.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(on_ready) = handler {
            on_ready();
        }
    }

    fn spawn_report(&self, err: StartupError, kind: ReportKind, elapsed: Duration) {
        let reporter = Arc::clone(&self.reporter);
        self.tasks
            .spawn(async move { reporter.report(err, kind, elapsed).await });
    }

    fn publish_failed(&self, kind: EventKind, err: &StartupError) {
        let mut ev = Event::new(kind).with_reason(err.as_message());
        if let StartupError::Component { component, .. } = err {
            ev = ev.with_component(component.as_str());
        }
        self.bus.publish(ev);
    }
}

/// Ready when every token is ready; fails with the first failure observed.
fn aggregate(tokens: Vec<ReadinessToken>) -> BoxFuture<'static, Result<(), StartupError>> {
    Box::pin(async move {
        try_join_all(tokens.into_iter().map(|token| async move {
            token
                .settled()
                .await
                .map_err(|source| StartupError::Component {
                    component: token.name().to_string(),
                    source,
                })
        }))
        .await
        .map(|_| ())
    })
}

fn pending_names(tokens: &[ReadinessToken]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| t.state() == Readiness::Pending)
        .map(|t| t.name().to_string())
        .collect()
}
