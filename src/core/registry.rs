//! # Component registry and dependency context.
//!
//! The registry is the fixed, ordered set of named components an application
//! needs before it is ready. Registration is synchronous:
//!
//! ```text
//! register(spec)
//!   ├─► name already taken?  ─► Err(DuplicateName)   (nothing spawned)
//!   ├─► registry sealed?     ─► Err(Sealed)
//!   ├─► ReadinessToken::pending(name) ─► (Settler, token)
//!   ├─► publish ComponentRegistered
//!   └─► tokio::spawn(drive_init(spec, settler))      (init starts now)
//! ```
//!
//! ## Rules
//! - Registration order is preserved; [`Registry::tokens`] returns tokens in that order.
//! - A failing component never fails registration; it surfaces through its token.
//! - Components reach earlier components' runtime objects through [`Context`],
//!   which couples construction order, not readiness.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::components::{ComponentSpec, ReadinessToken, Settler};
use crate::core::runner::drive_init;
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};

/// Type-keyed map of shared runtime objects.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use readyvisor::Context;
///
/// struct ProxySettings { port: u16 }
///
/// let mut ctx = Context::default();
/// ctx.insert(Arc::new(ProxySettings { port: 8000 }));
///
/// assert_eq!(ctx.get::<ProxySettings>().map(|p| p.port), Some(8000));
/// assert!(ctx.get::<String>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    objects: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// Stores `value`, replacing any previous object of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.objects.insert(TypeId::of::<T>(), value);
    }

    /// Returns the stored object of type `T`, if any.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.objects
            .get(&TypeId::of::<T>())
            .and_then(|obj| Arc::clone(obj).downcast::<T>().ok())
    }

    /// Returns `true` if an object of type `T` is stored.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.objects.contains_key(&TypeId::of::<T>())
    }
}

/// Ordered registry of components and their readiness tokens.
pub struct Registry {
    entries: Vec<ReadinessToken>,
    names: HashSet<String>,
    context: Context,
    bus: Bus,
    runtime_token: CancellationToken,
    sealed: bool,
}

impl Registry {
    /// Creates an empty registry publishing to `bus`.
    ///
    /// `runtime_token` is the parent of every init attempt's cancellation token.
    pub fn new(bus: Bus, runtime_token: CancellationToken) -> Self {
        Self {
            entries: Vec::new(),
            names: HashSet::new(),
            context: Context::default(),
            bus,
            runtime_token,
            sealed: false,
        }
    }

    /// Registers a component and starts its init in the background.
    ///
    /// Must be called inside a tokio runtime.
    pub fn register(&mut self, spec: ComponentSpec) -> Result<ReadinessToken, RegistryError> {
        let (settler, token) = self.admit(spec.name())?;

        tokio::spawn(drive_init(
            spec,
            settler,
            self.bus.clone(),
            self.runtime_token.clone(),
        ));
        Ok(token)
    }

    /// Registers a component that settles its own token.
    ///
    /// `factory` runs synchronously with the current [`Context`] and receives the
    /// [`Settler`]; it typically spawns work that resolves or fails it later.
    ///
    /// ## Example
    /// ```rust
    /// use readyvisor::{Bus, Registry};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut registry = Registry::new(Bus::new(16), CancellationToken::new());
    /// let token = registry
    ///     .register_with("send", |_ctx, settler| {
    ///         tokio::spawn(async move { let _ = settler.resolve(); });
    ///     })
    ///     .unwrap();
    /// assert_eq!(token.settled().await, Ok(()));
    /// # }
    /// ```
    pub fn register_with<F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<ReadinessToken, RegistryError>
    where
        F: FnOnce(&Context, Settler),
    {
        let name: String = name.into();
        let (settler, token) = self.admit(&name)?;
        factory(&self.context, settler);
        Ok(token)
    }

    /// Makes a runtime object available to components registered afterwards.
    pub fn provide<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.context.insert(value);
    }

    /// Dependency context shared with factories.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Readiness tokens in registration order.
    pub fn tokens(&self) -> Vec<ReadinessToken> {
        self.entries.clone()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|t| t.name().to_string()).collect()
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects further registrations (called when startup begins).
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Checks the programmer-error preconditions and creates the token pair.
    fn admit(&mut self, name: &str) -> Result<(Settler, ReadinessToken), RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed {
                name: name.to_string(),
            });
        }
        if !self.names.insert(name.to_string()) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        let (settler, token) = ReadinessToken::pending(name);
        self.entries.push(token.clone());
        self.bus
            .publish(Event::new(EventKind::ComponentRegistered).with_component(name));
        Ok((settler, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentFn, Readiness};
    use crate::error::ComponentError;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn registry() -> Registry {
        Registry::new(Bus::new(64), CancellationToken::new())
    }

    fn ok_spec(name: &'static str) -> ComponentSpec {
        ComponentSpec::new(ComponentFn::arc(name, |_ctx: CancellationToken| async {
            Ok::<_, ComponentError>(())
        }))
    }

    #[tokio::test]
    async fn duplicate_name_fails_before_any_work() {
        let mut reg = registry();
        reg.register(ok_spec("api")).unwrap();

        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let dup = ComponentSpec::new(ComponentFn::arc("api", move |_ctx: CancellationToken| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, ComponentError>(()) }
        }));

        let err = reg.register(dup).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { name: "api".into() });

        tokio::task::yield_now().await;
        assert!(!started.load(Ordering::SeqCst));
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn tokens_follow_registration_order() {
        let mut reg = registry();
        for name in ["accounts", "api", "ui", "proxy"] {
            reg.register(ok_spec(name)).unwrap();
        }
        assert_eq!(reg.names(), vec!["accounts", "api", "ui", "proxy"]);

        for token in reg.tokens() {
            assert_eq!(token.settled().await, Ok(()));
        }
    }

    #[tokio::test]
    async fn later_factory_reads_earlier_object() {
        struct Proxy {
            port: u16,
        }

        let mut reg = registry();
        reg.provide(Arc::new(Proxy { port: 8000 }));
        assert!(reg.context().contains::<Proxy>());
        assert!(!reg.context().contains::<String>());

        let token = reg
            .register_with("interceptors", |ctx, settler| {
                let _ = match ctx.get::<Proxy>() {
                    Some(proxy) if proxy.port == 8000 => settler.resolve(),
                    _ => settler.fail(ComponentError::fatal("proxy missing")),
                };
            })
            .unwrap();

        assert_eq!(token.state(), Readiness::Ready);
    }

    #[tokio::test]
    async fn sealed_registry_rejects() {
        let mut reg = registry();
        reg.seal();
        let err = reg.register(ok_spec("late")).unwrap_err();
        assert_eq!(err, RegistryError::Sealed { name: "late".into() });
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn registration_is_published() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut reg = Registry::new(bus, CancellationToken::new());
        reg.register_with("send", |_ctx, settler| drop(settler)).unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ComponentRegistered);
        assert_eq!(ev.component.as_deref(), Some("send"));
    }
}
