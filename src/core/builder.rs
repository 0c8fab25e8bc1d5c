use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        LaunchConfig, launcher::Launcher, registry::Registry, reporter::FailureReporter,
        supervisor::{ReadyHandler, StartupSupervisor},
    },
    events::Bus,
    reporting::ReportSink,
    subscribers::{Subscribe, SubscriberSet},
    update::UpdateCheckRef,
};

/// Builder for constructing a [`Launcher`] with optional features.
pub struct LauncherBuilder {
    cfg: LaunchConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    sink: Option<Arc<dyn ReportSink>>,
    on_ready: Option<ReadyHandler>,
    update_check: Option<UpdateCheckRef>,
}

impl LauncherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: LaunchConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            sink: None,
            on_ready: None,
            update_check: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (component lifecycle, startup outcome,
    /// update checks) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the external sink for timeout, failure and late-success reports.
    pub fn with_report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the ready consumer; it runs at most once, in time or late.
    pub fn on_ready<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_ready = Some(Box::new(f));
        self
    }

    /// Enables background update polling on the configured schedule.
    pub fn with_update_check(mut self, check: UpdateCheckRef) -> Self {
        self.update_check = Some(check);
        self
    }

    /// Builds the launcher.
    ///
    /// Initializes the event bus, spawns the subscriber listener, and creates the
    /// registry, reporter and supervisor. Must be called inside a tokio runtime.
    pub fn build(self) -> Launcher {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        // Stopped last, after reports published during shutdown are on the bus.
        let listener_stop = CancellationToken::new();

        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = subscriber_listener(&bus, subs, listener_stop.clone());

        let registry = Registry::new(bus.clone(), runtime_token.clone());
        let reporter = Arc::new(FailureReporter::new(self.sink, bus.clone()));
        let supervisor =
            StartupSupervisor::new(bus.clone(), reporter, self.on_ready, runtime_token.clone());

        Launcher::new_internal(
            self.cfg,
            bus,
            registry,
            supervisor,
            self.update_check,
            runtime_token,
            listener,
            listener_stop,
        )
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
///
/// On cancel, drains what is already buffered and shuts the workers down.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(&ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        set.shutdown().await;
    })
}
