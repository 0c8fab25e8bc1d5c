//! # Component init driver.
//!
//! Runs one component's init attempts and settles its readiness token exactly once.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► attempt += 1, publish ComponentStarting
//!   ├─► run_attempt() ─► component.init(child token) [+ timeout] [+ panic catch]
//!   │       ├─ Ok                                 ─► break Ready
//!   │       ├─ Err(retryable) && attempts left    ─► publish BackoffScheduled, sleep
//!   │       └─ Err(other) / budget exhausted      ─► break Failed
//!   └─ runtime token cancelled during backoff     ─► break Failed(Canceled)
//! }
//! publish ComponentReady / ComponentGaveUp, then settle the token
//! ```
//!
//! ## Rules
//! - The event is published **before** the token settles, so a component's
//!   terminal event always precedes the startup outcome on the bus.
//! - Each attempt gets a child token; a timed-out attempt's child is cancelled.
//! - A panicking init is converted into `ComponentError::Fatal`.

use std::time::Duration;

use futures::FutureExt;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    components::{Component, ComponentSpec, Settler},
    error::ComponentError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
};

/// Drives `spec`'s component to a terminal state and settles `settler`.
pub(crate) async fn drive_init(
    spec: ComponentSpec,
    settler: Settler,
    bus: Bus,
    runtime_token: CancellationToken,
) {
    let component = spec.component().as_ref();
    let budget = spec.attempts().max(1);
    let mut attempt: u32 = 0;

    let result = loop {
        attempt += 1;
        bus.publish(
            Event::new(EventKind::ComponentStarting)
                .with_component(component.name())
                .with_attempt(attempt),
        );

        let err = match run_attempt(
            component,
            &runtime_token,
            spec.attempt_timeout(),
            attempt,
            &bus,
        )
        .await
        {
            Ok(()) => break Ok(()),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= budget {
            break Err(err);
        }

        let delay = spec.backoff().delay_for(attempt - 1);
        bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_component(component.name())
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(err.to_string()),
        );
        select! {
            _ = time::sleep(delay) => {}
            _ = runtime_token.cancelled() => break Err(ComponentError::Canceled),
        }
    };

    match result {
        Ok(()) => {
            bus.publish(
                Event::new(EventKind::ComponentReady)
                    .with_component(component.name())
                    .with_attempt(attempt),
            );
            let _ = settler.resolve();
        }
        Err(err) => {
            bus.publish(
                Event::new(EventKind::ComponentGaveUp)
                    .with_component(component.name())
                    .with_attempt(attempt)
                    .with_reason(err.to_string()),
            );
            let _ = settler.fail(err);
        }
    }
}

/// Executes a single init attempt, publishing `ComponentTimeoutHit` / `ComponentFailed`.
async fn run_attempt(
    component: &dyn Component,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    attempt: u32,
    bus: &Bus,
) -> Result<(), ComponentError> {
    let child = parent.child_token();
    let guarded = std::panic::AssertUnwindSafe(component.init(child.clone())).catch_unwind();

    let res = if let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) {
        match time::timeout(dur, guarded).await {
            Ok(r) => r,
            Err(_elapsed) => {
                child.cancel();
                bus.publish(
                    Event::new(EventKind::ComponentTimeoutHit)
                        .with_component(component.name())
                        .with_timeout(dur)
                        .with_attempt(attempt),
                );
                Ok(Err(ComponentError::Timeout { timeout: dur }))
            }
        }
    } else {
        guarded.await
    };

    let res = res.unwrap_or_else(|panic_err| {
        Err(ComponentError::Fatal {
            error: format!("init panicked: {}", panic_message(panic_err.as_ref())),
        })
    });

    if let Err(e) = &res {
        if !matches!(e, ComponentError::Canceled) {
            bus.publish(
                Event::new(EventKind::ComponentFailed)
                    .with_component(component.name())
                    .with_attempt(attempt)
                    .with_reason(e.to_string()),
            );
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentFn, Readiness, ReadinessToken};
    use crate::policies::BackoffPolicy;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(fail_times: u32, calls: Arc<AtomicU32>, err: ComponentError) -> ComponentSpec {
        let component = ComponentFn::arc("flaky", move |_ctx: CancellationToken| {
            let calls = calls.clone();
            let err = err.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= fail_times { Err(err) } else { Ok(()) }
            }
        });
        ComponentSpec::new(component)
    }

    async fn drive(spec: ComponentSpec) -> (ReadinessToken, Vec<EventKind>) {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (settler, token) = ReadinessToken::pending(spec.name().to_string());
        drive_init(spec, settler, bus, CancellationToken::new()).await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        (token, kinds)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_until_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = flaky(2, calls.clone(), ComponentError::fail("refused"))
            .with_attempts(3)
            .with_backoff(BackoffPolicy::constant(Duration::from_millis(100)));

        let started = time::Instant::now();
        let (token, kinds) = drive(spec).await;

        assert_eq!(token.state(), Readiness::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::BackoffScheduled).count(),
            2
        );
        assert_eq!(kinds.last(), Some(&EventKind::ComponentReady));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = flaky(5, calls.clone(), ComponentError::fatal("bad config")).with_attempts(5);

        let (token, kinds) = drive(spec).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            token.state(),
            Readiness::Failed(ComponentError::fatal("bad config"))
        );
        assert_eq!(kinds.last(), Some(&EventKind::ComponentGaveUp));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_settles_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = flaky(10, calls.clone(), ComponentError::fail("down")).with_attempts(2);

        let (token, _) = drive(spec).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(token.state(), Readiness::Failed(ComponentError::fail("down")));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_timeout_cancels_child_and_reports() {
        let component = ComponentFn::arc("slow", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err(ComponentError::Canceled)
        });
        let spec = ComponentSpec::new(component)
            .with_attempt_timeout(Some(Duration::from_millis(300)));

        let (token, kinds) = drive(spec).await;

        assert_eq!(
            token.state(),
            Readiness::Failed(ComponentError::Timeout {
                timeout: Duration::from_millis(300)
            })
        );
        assert!(kinds.contains(&EventKind::ComponentTimeoutHit));
    }

    #[tokio::test]
    async fn panicking_init_becomes_fatal() {
        let component = ComponentFn::arc("boom", |_ctx: CancellationToken| async move {
            let explode = true;
            if explode {
                panic!("store exploded");
            }
            Ok::<(), ComponentError>(())
        });

        let (token, _) = drive(ComponentSpec::new(component).with_attempts(3)).await;

        match token.state() {
            Readiness::Failed(ComponentError::Fatal { error }) => {
                assert!(error.contains("store exploded"), "{error}");
            }
            other => panic!("unexpected state {other:?}"),
        }
    }
}
