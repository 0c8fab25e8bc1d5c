//! # Update check abstraction.
//!
//! An [`UpdateCheck`] is the external "please look for a new version" channel the
//! poller signals on schedule. It has two steps:
//! - [`register`](UpdateCheck::register): one-time capability probe before the first check;
//! - [`check`](UpdateCheck::check): one update check, called every poll tick.
//!
//! Returning [`UpdateError::Unsupported`] from either step disables polling for
//! the rest of the process. Any other error is logged and polling continues.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UpdateError;

/// Shared handle to an update check.
pub type UpdateCheckRef = Arc<dyn UpdateCheck>;

/// External update channel signalled by the poller.
#[async_trait]
pub trait UpdateCheck: Send + Sync + 'static {
    /// Probes the update mechanism once, before the first check.
    ///
    /// Default: always available.
    async fn register(&self) -> Result<(), UpdateError> {
        Ok(())
    }

    /// Signals one update check.
    async fn check(&self) -> Result<(), UpdateError>;
}

/// Closure-backed update check without a capability probe.
///
/// ## Example
/// ```rust
/// use readyvisor::{UpdateCheckFn, UpdateCheckRef, UpdateError};
///
/// let check: UpdateCheckRef = UpdateCheckFn::arc(|| async {
///     // ask the server to look for updates...
///     Ok::<_, UpdateError>(())
/// });
/// ```
pub struct UpdateCheckFn<F> {
    f: F,
}

impl<F> UpdateCheckFn<F> {
    /// Creates the check and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> UpdateCheck for UpdateCheckFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), UpdateError>> + Send + 'static,
{
    async fn check(&self) -> Result<(), UpdateError> {
        (self.f)().await
    }
}
