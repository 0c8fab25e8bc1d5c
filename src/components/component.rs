//! # Component abstraction.
//!
//! A [`Component`] is anything the application needs initialized before it is
//! usable: an account store, an API client, a proxy controller. It has a stable
//! [`name`](Component::name) and an async [`init`](Component::init) that
//! receives a [`CancellationToken`] cancelled on launcher shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ComponentError;

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;

/// # Asynchronously initialized unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use readyvisor::{Component, ComponentError};
///
/// struct AccountStore;
///
/// #[async_trait]
/// impl Component for AccountStore {
///     fn name(&self) -> &str { "accounts" }
///
///     async fn init(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
///         if ctx.is_cancelled() {
///             return Err(ComponentError::Canceled);
///         }
///         // load the session...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns a stable, unique component name.
    fn name(&self) -> &str;

    /// Performs one init attempt.
    ///
    /// Called again on retryable errors if its [`ComponentSpec`](crate::ComponentSpec) allows more attempts.
    async fn init(&self, ctx: CancellationToken) -> Result<(), ComponentError>;
}
