//! Staged startup with a slow component, a report sink and update polling.
//!
//! Run with: `cargo run --example startup --features logging`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use readyvisor::{
    BackoffPolicy, ComponentError, ComponentFn, ComponentSpec, FailureReport, LaunchConfig,
    Launcher, LogWriter, ReportSink, SinkError, StartupStatus, Subscribe, UpdateCheck,
    UpdateError,
};
use tokio_util::sync::CancellationToken;

struct StderrSink;

#[async_trait]
impl ReportSink for StderrSink {
    async fn send(&self, report: &FailureReport) -> Result<(), SinkError> {
        eprintln!(
            "report kind={} after={:?}: {}",
            report.kind.as_label(),
            report.elapsed,
            report.error
        );
        Ok(())
    }
}

struct DevBuildUpdater;

#[async_trait]
impl UpdateCheck for DevBuildUpdater {
    async fn register(&self) -> Result<(), UpdateError> {
        Err(UpdateError::Unsupported {
            reason: "development build".into(),
        })
    }

    async fn check(&self) -> Result<(), UpdateError> {
        Ok(())
    }
}

struct ProxyPort(u16);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = LaunchConfig {
        deadline: Duration::from_secs(2),
        initial_poll_delay: Duration::from_secs(1),
        ..LaunchConfig::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mut launcher = Launcher::builder(cfg)
        .with_subscribers(subs)
        .with_report_sink(Arc::new(StderrSink))
        .with_update_check(Arc::new(DevBuildUpdater))
        .on_ready(|| println!(">>> main window shown"))
        .build();

    let accounts = ComponentFn::arc("accounts", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<_, ComponentError>(())
    });
    launcher.register(ComponentSpec::new(accounts))?;

    let flaky = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let api = ComponentFn::arc("api", move |_ctx: CancellationToken| {
        let flaky = flaky.clone();
        async move {
            if flaky.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
                return Err(ComponentError::fail("connection refused"));
            }
            Ok(())
        }
    });
    launcher.register(
        ComponentSpec::new(api)
            .with_attempts(3)
            .with_backoff(BackoffPolicy::constant(Duration::from_millis(200))),
    )?;

    launcher.provide(Arc::new(ProxyPort(8000)));
    launcher.register_with("events", |ctx, settler| {
        let port = ctx.get::<ProxyPort>().map(|p| p.0);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            let _ = match port {
                Some(_) => settler.resolve(),
                None => settler.fail(ComponentError::fatal("proxy not started")),
            };
        });
    })?;

    let outcome = launcher.start().await?;
    println!(">>> primary outcome: {}", outcome.as_label());

    let mut status = launcher.status();
    status
        .wait_for(|s| *s == StartupStatus::Ready)
        .await
        .map_err(|e| e.to_string())?;
    println!(">>> recovered from error screen");

    launcher.shutdown().await;
    Ok(())
}
