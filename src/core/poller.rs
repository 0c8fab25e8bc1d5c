//! # Update poller: fixed-schedule background update checks.
//!
//! ```text
//! start ──(initial_delay)──► tick ──(interval)──► tick ──(interval)──► ...
//!                             │                    │
//!                             ├─ spawn check()     └─ spawn check()
//!                             └─ spawn register()      capability probe, first tick only
//!
//! status becomes Ready (in time or late) ─► spawn check()   once
//!
//! finished call:
//!   ├─ Ok           ─► UpdateRegistered / UpdateChecked
//!   ├─ Unsupported  ─► UpdateUnsupported, stop ticking
//!   └─ Err / panic  ─► UpdateCheckFailed, keep schedule
//! ```
//!
//! ## Rules
//! - Calls run in their own tasks; a slow or hung call never delays the next tick.
//! - No backoff or jitter; failures never shift the schedule.
//! - Calls already running when `Unsupported` arrives are left to finish.
//! - Runs until `Unsupported` or until its token is cancelled (which aborts running calls).

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::supervisor::StartupStatus;
use crate::error::UpdateError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::update::{PollSchedule, UpdateCheckRef};

/// Why the poller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    /// The update mechanism is not available in this environment.
    Unsupported,
    /// The runtime token was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Probe,
    Check,
}

enum Wake {
    Cancelled,
    Tick,
    Ready(bool),
    Finished(Option<(Call, Result<(), UpdateError>)>),
}

/// Signals an [`UpdateCheck`](crate::UpdateCheck) on a [`PollSchedule`].
pub struct UpdatePoller {
    schedule: PollSchedule,
    bus: Bus,
    ready: Option<watch::Receiver<StartupStatus>>,
}

impl UpdatePoller {
    /// Creates a poller publishing its events to `bus`.
    pub fn new(schedule: PollSchedule, bus: Bus) -> Self {
        Self {
            schedule,
            bus,
            ready: None,
        }
    }

    /// Also checks once as soon as `status` reports [`StartupStatus::Ready`].
    pub fn with_ready_signal(mut self, status: watch::Receiver<StartupStatus>) -> Self {
        self.ready = Some(status);
        self
    }

    /// Spawns [`run`](Self::run) onto the current runtime.
    pub fn start(self, check: UpdateCheckRef, token: CancellationToken) -> JoinHandle<PollerExit> {
        tokio::spawn(self.run(check, token))
    }

    /// Polls until the check is unsupported or `token` is cancelled.
    pub async fn run(mut self, check: UpdateCheckRef, token: CancellationToken) -> PollerExit {
        let first = Instant::now() + self.schedule.initial_delay();
        let mut ticks = time::interval_at(first, self.schedule.interval());
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut calls: JoinSet<(Call, Result<(), UpdateError>)> = JoinSet::new();
        let mut probed = false;

        loop {
            let wake = tokio::select! {
                biased;
                _ = token.cancelled() => Wake::Cancelled,
                Some(joined) = calls.join_next() => Wake::Finished(joined.ok()),
                ok = became_ready(&mut self.ready) => Wake::Ready(ok),
                _ = ticks.tick() => Wake::Tick,
            };

            match wake {
                Wake::Cancelled => return PollerExit::Cancelled,
                Wake::Tick => {
                    spawn_call(&mut calls, &check, Call::Check);
                    if !probed {
                        probed = true;
                        spawn_call(&mut calls, &check, Call::Probe);
                    }
                }
                Wake::Ready(ok) => {
                    self.ready = None;
                    if ok {
                        spawn_call(&mut calls, &check, Call::Check);
                    }
                }
                Wake::Finished(None) => {}
                Wake::Finished(Some((_, Err(e)))) if e.is_unsupported() => {
                    calls.detach_all();
                    return self.unsupported(&e);
                }
                Wake::Finished(Some((call, res))) => self.publish(call, res),
            }
        }
    }

    fn publish(&self, call: Call, res: Result<(), UpdateError>) {
        let ev = match (call, res) {
            (Call::Probe, Ok(())) => Event::new(EventKind::UpdateRegistered),
            (Call::Check, Ok(())) => Event::new(EventKind::UpdateChecked),
            // A failed probe is advisory; the schedule keeps running.
            (_, Err(e)) => Event::new(EventKind::UpdateCheckFailed).with_reason(e.to_string()),
        };
        self.bus.publish(ev);
    }

    fn unsupported(&self, err: &UpdateError) -> PollerExit {
        self.bus
            .publish(Event::new(EventKind::UpdateUnsupported).with_reason(err.to_string()));
        PollerExit::Unsupported
    }
}

/// Resolves once when startup reports ready; `false` if the status went away.
async fn became_ready(status: &mut Option<watch::Receiver<StartupStatus>>) -> bool {
    match status {
        Some(rx) => rx.wait_for(|s| *s == StartupStatus::Ready).await.is_ok(),
        None => std::future::pending().await,
    }
}

fn spawn_call(
    calls: &mut JoinSet<(Call, Result<(), UpdateError>)>,
    check: &UpdateCheckRef,
    call: Call,
) {
    let check = Arc::clone(check);
    calls.spawn(async move {
        let res = match call {
            Call::Probe => guarded(check.register()).await,
            Call::Check => guarded(check.check()).await,
        };
        (call, res)
    });
}

/// Awaits one call, turning a panic into [`UpdateError::Failed`].
async fn guarded<F>(fut: F) -> Result<(), UpdateError>
where
    F: Future<Output = Result<(), UpdateError>>,
{
    std::panic::AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic_err| {
            Err(UpdateError::Failed {
                error: format!("check panicked: {}", panic_message(panic_err.as_ref())),
            })
        })
}
