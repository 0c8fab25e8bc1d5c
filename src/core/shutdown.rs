//! # Cross-platform OS shutdown signal.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`. **Other platforms:** Ctrl-C.

use crate::error::RuntimeError;

/// Waits for a termination signal and returns its name.
///
/// Fails with [`RuntimeError::Signal`] if listeners cannot be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
///
/// Fails with [`RuntimeError::Signal`] if the listener cannot be installed.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> Result<&'static str, RuntimeError> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
