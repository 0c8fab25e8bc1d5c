//! Runtime core: registration, the startup race and background work.
//!
//! The public entry point is [`Launcher`], built with [`LauncherBuilder`].
//!
//! Internal modules:
//! - [`registry`]: ordered component registry and dependency [`Context`];
//! - [`runner`]: drives one component's init attempts and settles its token;
//! - [`supervisor`]: races aggregate readiness against the deadline;
//! - [`poller`]: fixed-schedule update checks;
//! - [`reporter`]: forwards startup reports to the external sink;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod launcher;
mod poller;
mod registry;
mod reporter;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::LauncherBuilder;
pub use config::LaunchConfig;
pub use launcher::Launcher;
pub use poller::{PollerExit, UpdatePoller};
pub use registry::{Context, Registry};
pub use reporter::FailureReporter;
pub use supervisor::{ReadyHandler, StartupOutcome, StartupStatus, StartupSupervisor};
