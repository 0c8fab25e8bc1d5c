//! # Launcher: wiring for registry, startup race, reporting and update polling.
//!
//! ```text
//! Launcher::builder(cfg)
//!   .with_subscribers(..) .with_report_sink(..) .on_ready(..) .with_update_check(..)
//!   .build()                      ─► Bus + listener ─► SubscriberSet
//!
//! launcher.register(spec) ...     ─► Registry (init starts immediately)
//! launcher.start().await
//!   ├─► seal registry
//!   ├─► spawn UpdatePoller       (independent of the startup outcome)
//!   └─► StartupSupervisor::await_all(tokens, cfg.deadline) ─► StartupOutcome
//! launcher.run_until_shutdown().await
//!   └─► OS signal ─► ShutdownRequested ─► cancel runtime token
//!         ─► await poller ─► await pending reports ─► drain subscribers
//! ```

use std::any::Any;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    components::{ComponentSpec, ReadinessToken, Settler},
    core::{
        LaunchConfig,
        builder::LauncherBuilder,
        poller::{PollerExit, UpdatePoller},
        registry::{Context, Registry},
        shutdown,
        supervisor::{StartupOutcome, StartupStatus, StartupSupervisor},
    },
    error::{RegistryError, RuntimeError},
    events::{Bus, Event, EventKind},
    update::UpdateCheckRef,
};

/// Top-level application launcher.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use readyvisor::{ComponentError, ComponentFn, ComponentSpec, LaunchConfig, Launcher};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cfg = LaunchConfig { deadline: Duration::from_secs(2), ..LaunchConfig::default() };
/// let mut launcher = Launcher::builder(cfg)
///     .on_ready(|| println!("window shown"))
///     .build();
///
/// let accounts = ComponentFn::arc("accounts", |_ctx: CancellationToken| async {
///     Ok::<_, ComponentError>(())
/// });
/// launcher.register(ComponentSpec::new(accounts)).unwrap();
///
/// let outcome = launcher.start().await.unwrap();
/// assert!(outcome.is_ready());
/// launcher.shutdown().await;
/// # }
/// ```
pub struct Launcher {
    cfg: LaunchConfig,
    bus: Bus,
    registry: Registry,
    supervisor: Arc<StartupSupervisor>,
    update_check: Option<UpdateCheckRef>,
    runtime_token: CancellationToken,
    listener: JoinHandle<()>,
    listener_stop: CancellationToken,
    poller: Option<JoinHandle<PollerExit>>,
    started: bool,
}

impl Launcher {
    /// Returns a builder for a launcher with the given configuration.
    pub fn builder(cfg: LaunchConfig) -> LauncherBuilder {
        LauncherBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: LaunchConfig,
        bus: Bus,
        registry: Registry,
        supervisor: Arc<StartupSupervisor>,
        update_check: Option<UpdateCheckRef>,
        runtime_token: CancellationToken,
        listener: JoinHandle<()>,
        listener_stop: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            supervisor,
            update_check,
            runtime_token,
            listener,
            listener_stop,
            poller: None,
            started: false,
        }
    }

    /// Registers a component (init starts immediately).
    pub fn register(&mut self, spec: ComponentSpec) -> Result<ReadinessToken, RegistryError> {
        self.registry.register(spec)
    }

    /// Registers a component using its global config defaults (attempts, backoff, timeout).
    pub fn register_default(
        &mut self,
        component: crate::components::ComponentRef,
    ) -> Result<ReadinessToken, RegistryError> {
        let spec = ComponentSpec::with_defaults(component, &self.cfg);
        self.registry.register(spec)
    }

    /// Registers a component that settles its own token (see [`Registry::register_with`]).
    pub fn register_with<F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<ReadinessToken, RegistryError>
    where
        F: FnOnce(&Context, Settler),
    {
        self.registry.register_with(name, factory)
    }

    /// Makes a runtime object available to components registered afterwards.
    pub fn provide<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.registry.provide(value);
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The event bus (subscribe for raw events).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Seals the registry, starts update polling and races readiness against the deadline.
    ///
    /// With an update check configured, one extra check fires when startup becomes
    /// ready (in time or late), in addition to the schedule.
    ///
    /// Returns the primary outcome. Fails only if called twice.
    pub async fn start(&mut self) -> Result<StartupOutcome, RuntimeError> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.started = true;
        self.registry.seal();

        if let Some(check) = self.update_check.clone() {
            let poller = UpdatePoller::new(self.cfg.poll_schedule(), self.bus.clone())
                .with_ready_signal(self.supervisor.watch());
            self.poller = Some(poller.start(check, self.runtime_token.clone()));
        }

        Ok(self
            .supervisor
            .await_all(self.registry.tokens(), self.cfg.deadline)
            .await)
    }

    /// Primary outcome, once [`start`](Self::start) has produced it.
    pub fn outcome(&self) -> Option<StartupOutcome> {
        self.supervisor.outcome()
    }

    /// Watches the displayable status (an error screen may later become ready).
    pub fn status(&self) -> watch::Receiver<StartupStatus> {
        self.supervisor.watch()
    }

    /// Waits for an OS termination signal, then shuts down.
    ///
    /// Shutdown happens even if signal listeners could not be installed; the
    /// error is returned afterwards.
    pub async fn run_until_shutdown(self) -> Result<(), RuntimeError> {
        let res = shutdown::wait_for_shutdown_signal().await;
        if let Ok(signal) = &res {
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_reason(*signal));
        }
        self.shutdown().await;
        res.map(|_| ())
    }

    /// Cancels components, the poller and the background wait, waits for
    /// pending reports, then drains subscribers.
    ///
    /// Waits as long as the report sink takes to deliver.
    pub async fn shutdown(self) {
        self.runtime_token.cancel();
        if let Some(poller) = self.poller {
            let _ = poller.await;
        }
        self.supervisor.drain().await;
        self.listener_stop.cancel();
        let _ = self.listener.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentFn;
    use crate::error::{ComponentError, SinkError, StartupError, UpdateError};
    use crate::reporting::{FailureReport, ReportKind, ReportSink};
    use crate::subscribers::Subscribe;
    use crate::update::UpdateCheckFn;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time;

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<ReportKind>);

    #[async_trait]
    impl ReportSink for ChannelSink {
        async fn send(&self, report: &FailureReport) -> Result<(), SinkError> {
            let _ = self.0.send(report.kind);
            Ok(())
        }
    }

    fn delayed(name: &'static str, after: Duration) -> ComponentSpec {
        ComponentSpec::new(ComponentFn::arc(name, move |_ctx: CancellationToken| async move {
            time::sleep(after).await;
            Ok::<_, ComponentError>(())
        }))
    }

    fn cfg() -> LaunchConfig {
        LaunchConfig {
            deadline: Duration::from_secs(10),
            ..LaunchConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_startup_notifies_once_and_logs_outcome() {
        let kinds = Arc::new(Kinds::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut launcher = Launcher::builder(cfg())
            .with_subscribers(vec![kinds.clone() as Arc<dyn Subscribe>])
            .on_ready(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        launcher
            .register(delayed("accounts", Duration::from_secs(1)))
            .unwrap();
        launcher.register(delayed("api", Duration::from_secs(2))).unwrap();

        let outcome = launcher.start().await.unwrap();
        assert_eq!(outcome, StartupOutcome::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*launcher.status().borrow(), StartupStatus::Ready);

        launcher.shutdown().await;
        let seen = kinds.0.lock().unwrap().clone();
        assert_eq!(
            seen.iter().filter(|k| **k == EventKind::ComponentReady).count(),
            2
        );
        assert_eq!(seen.last(), Some(&EventKind::StartupReady));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_component_times_out_then_recovers() {
        let (tx, mut reports) = mpsc::unbounded_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut launcher = Launcher::builder(cfg())
            .with_report_sink(Arc::new(ChannelSink(tx)))
            .on_ready(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        launcher
            .register(delayed("events", Duration::from_secs(12)))
            .unwrap();

        let outcome = launcher.start().await.unwrap();
        assert_eq!(
            outcome,
            StartupOutcome::TimedOut {
                deadline: Duration::from_secs(10),
                pending: vec!["events".into()],
            }
        );
        assert_eq!(reports.recv().await, Some(ReportKind::Timeout));
        assert_eq!(reports.recv().await, Some(ReportKind::LateSuccess));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(launcher.outcome().is_some_and(|o| !o.is_ready()));
        launcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_component_fails_startup() {
        let mut launcher = Launcher::builder(cfg()).build();
        launcher.register(delayed("ui", Duration::from_secs(1))).unwrap();
        launcher
            .register(ComponentSpec::new(ComponentFn::arc(
                "rules",
                |_ctx: CancellationToken| async { Err::<(), _>(ComponentError::fatal("corrupt rules")) },
            )))
            .unwrap();

        let outcome = launcher.start().await.unwrap();
        match outcome.error() {
            Some(StartupError::Component { component, source }) => {
                assert_eq!(component, "rules");
                assert_eq!(source, ComponentError::fatal("corrupt rules"));
            }
            other => panic!("unexpected {other:?}"),
        }
        launcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_and_register_after_start_are_rejected() {
        let mut launcher = Launcher::builder(cfg()).build();
        assert_eq!(launcher.start().await.unwrap(), StartupOutcome::Ready);

        assert!(matches!(
            launcher.start().await,
            Err(RuntimeError::AlreadyStarted)
        ));
        assert_eq!(
            launcher.register(delayed("late", Duration::ZERO)).unwrap_err(),
            RegistryError::Sealed {
                name: "late".into()
            }
        );
        launcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn poller_runs_regardless_of_startup_and_stops_on_shutdown() {
        let checks = Arc::new(AtomicUsize::new(0));
        let n = checks.clone();
        let mut launcher = Launcher::builder(cfg())
            .with_update_check(UpdateCheckFn::arc(move || {
                n.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, UpdateError>(()) }
            }))
            .build();
        launcher
            .register(ComponentSpec::new(ComponentFn::arc(
                "proxy",
                |_ctx: CancellationToken| async { Err::<(), _>(ComponentError::fatal("port in use")) },
            )))
            .unwrap();

        let outcome = launcher.start().await.unwrap();
        assert_eq!(outcome.as_label(), "failed");

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 1);

        launcher.shutdown().await;
        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_startup_checks_for_updates_right_away() {
        let checks = Arc::new(AtomicUsize::new(0));
        let n = checks.clone();
        let mut launcher = Launcher::builder(cfg())
            .with_update_check(UpdateCheckFn::arc(move || {
                n.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, UpdateError>(()) }
            }))
            .build();
        launcher.register(delayed("api", Duration::from_secs(1))).unwrap();

        assert!(launcher.start().await.unwrap().is_ready());
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 1);

        // The schedule is unaffected: the first periodic check still comes at 5s.
        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(checks.load(Ordering::SeqCst), 2);
        launcher.shutdown().await;
    }

    struct SlowSink(mpsc::UnboundedSender<ReportKind>);

    #[async_trait]
    impl ReportSink for SlowSink {
        async fn send(&self, report: &FailureReport) -> Result<(), SinkError> {
            time::sleep(Duration::from_millis(20)).await;
            let _ = self.0.send(report.kind);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_delivers_pending_report() {
        let (tx, mut reports) = mpsc::unbounded_channel();
        let kinds = Arc::new(Kinds::default());
        let mut launcher = Launcher::builder(cfg())
            .with_subscribers(vec![kinds.clone() as Arc<dyn Subscribe>])
            .with_report_sink(Arc::new(SlowSink(tx)))
            .build();
        launcher
            .register(ComponentSpec::new(ComponentFn::arc(
                "store",
                |_ctx: CancellationToken| async { Err::<(), _>(ComponentError::fatal("disk full")) },
            )))
            .unwrap();

        assert_eq!(launcher.start().await.unwrap().as_label(), "failed");
        launcher.shutdown().await;

        assert_eq!(reports.try_recv().ok(), Some(ReportKind::Failed));
        assert!(kinds.0.lock().unwrap().contains(&EventKind::ReportSent));
    }

    #[tokio::test]
    async fn provided_objects_reach_later_components() {
        struct Settings {
            port: u16,
        }

        let mut launcher = Launcher::builder(cfg()).build();
        launcher.provide(Arc::new(Settings { port: 8000 }));
        launcher
            .register_with("interceptors", |ctx, settler| {
                let _ = match ctx.get::<Settings>() {
                    Some(s) if s.port == 8000 => settler.resolve(),
                    _ => settler.fail(ComponentError::fatal("no proxy settings")),
                };
            })
            .unwrap();

        assert!(launcher.start().await.unwrap().is_ready());
        launcher.shutdown().await;
    }
}
