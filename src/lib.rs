//! # readyvisor
//!
//! **Readyvisor** supervises staged application startup in async Rust.
//!
//! An application registers named components whose initialization runs
//! concurrently. Each component settles a single-use readiness token. The
//! launcher races all tokens against a deadline and reports the outcome, keeps
//! waiting in the background after a timeout so a late success is still noticed,
//! and polls for updates on a fixed schedule, independently of startup.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ComponentSpec │   │ComponentSpec │   │ register_with│
//!     │  (accounts)  │   │    (api)     │   │   (events)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (ordered, unique names, dependency Context)             │
//! │  - spawns drive_init per component (attempts, backoff, timeout)   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ReadinessToken     ReadinessToken     ReadinessToken   (Pending → Ready | Failed, once)
//!        └──────────────────┼──────────────────┘
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  StartupSupervisor                                                │
//! │  all ready ─► Ready ─► on_ready()                                 │
//! │  first failure ─► Failed ─► FailureReporter (failed)              │
//! │  deadline ─► TimedOut ─► FailureReporter (timeout)                │
//! │              └─► background wait ─► late success ─► on_ready()    │
//! │                                   └► FailureReporter (late-success)│
//! └───────────────────────────────────────────────────────────────────┘
//!
//!   UpdatePoller: initial_delay ─► check ─► interval ─► check ─► ...
//!
//! Every transition ─► Bus (broadcast) ─► listener ─► SubscriberSet
//!                                                    ├─► LogWriter
//!                                                    └─► custom subscribers
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                           |
//! |-------------------|-----------------------------------------------------------------|----------------------------------------------|
//! | **Components**    | Define named async initializers and their retry policy.         | [`Component`], [`ComponentFn`], [`ComponentSpec`] |
//! | **Readiness**     | Single-settlement readiness handles.                            | [`ReadinessToken`], [`Settler`]              |
//! | **Startup**       | Race readiness against a deadline, notify once.                 | [`Launcher`], [`StartupSupervisor`]          |
//! | **Reporting**     | Forward timeouts, failures and late successes to a sink.        | [`ReportSink`], [`FailureReporter`]          |
//! | **Updates**       | Fixed-schedule update checks.                                   | [`UpdateCheck`], [`UpdatePoller`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics).                  | [`Subscribe`]                                |
//! | **Errors**        | Typed errors with stable labels.                                | [`ComponentError`], [`StartupError`]         |
//! | **Configuration** | Centralize launcher settings.                                   | [`LaunchConfig`]                             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use readyvisor::{ComponentError, ComponentFn, ComponentSpec, LaunchConfig, Launcher};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = LaunchConfig::default();
//!     cfg.deadline = Duration::from_secs(5);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn readyvisor::Subscribe>> = {
//!         use readyvisor::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn readyvisor::Subscribe>> = Vec::new();
//!
//!     let mut launcher = Launcher::builder(cfg)
//!         .with_subscribers(subs)
//!         .on_ready(|| println!("ready"))
//!         .build();
//!
//!     let store = ComponentFn::arc("store", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() { return Err(ComponentError::Canceled); }
//!         Ok(())
//!     });
//!     launcher.register(ComponentSpec::new(store).with_attempts(3))?;
//!
//!     let outcome = launcher.start().await?;
//!     println!("startup: {}", outcome.as_label());
//!     launcher.shutdown().await;
//!     Ok(())
//! }
//! ```
mod components;
mod core;
mod error;
mod events;
mod policies;
mod reporting;
mod subscribers;
mod update;

// ---- Public re-exports ----

pub use components::{Component, ComponentFn, ComponentRef, ComponentSpec, Readiness, ReadinessToken, Settler};
pub use core::{
    Context, FailureReporter, LaunchConfig, Launcher, LauncherBuilder, PollerExit, ReadyHandler,
    Registry, StartupOutcome, StartupStatus, StartupSupervisor, UpdatePoller,
};
pub use error::{
    ComponentError, RegistryError, RuntimeError, SettleError, SinkError, StartupError, UpdateError,
};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use reporting::{FailureReport, ReportKind, ReportSink};
pub use subscribers::{Subscribe, SubscriberSet};
pub use update::{PollSchedule, UpdateCheck, UpdateCheckFn, UpdateCheckRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
