//! # Function-backed component (`ComponentFn`)
//!
//! [`ComponentFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh init future per attempt. Shared state between attempts goes through an
//! explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use readyvisor::{ComponentFn, ComponentRef, ComponentError};
//!
//! let c: ComponentRef = ComponentFn::arc("api", |_ctx: CancellationToken| async move {
//!     Ok::<_, ComponentError>(())
//! });
//!
//! assert_eq!(c.name(), "api");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::components::component::Component;
use crate::error::ComponentError;

/// Function-backed component implementation.
#[derive(Debug)]
pub struct ComponentFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ComponentFn<F> {
    /// Creates a new function-backed component.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the component and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Component for ComponentFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        (self.f)(ctx).await
    }
}
