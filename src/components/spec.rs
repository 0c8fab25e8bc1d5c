//! # Component specification.
//!
//! [`ComponentSpec`] bundles a component with its private retry policy: how many
//! attempts, how long to wait between them, and an optional per-attempt timeout.
//! All retries happen before the component's readiness token settles.
//!
//! A spec can be created:
//! - **Explicitly** with [`ComponentSpec::new`] (one attempt, no timeout)
//! - **From config** with [`ComponentSpec::with_defaults`]

use std::time::Duration;

use crate::{components::ComponentRef, core::LaunchConfig, policies::BackoffPolicy};

/// Specification for initializing one component.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use readyvisor::{ComponentError, ComponentFn, ComponentSpec, BackoffPolicy};
///
/// let api = ComponentFn::arc("api", |_ctx: CancellationToken| async {
///     Ok::<_, ComponentError>(())
/// });
///
/// let spec = ComponentSpec::new(api)
///     .with_attempts(3)
///     .with_backoff(BackoffPolicy::constant(Duration::from_millis(200)))
///     .with_attempt_timeout(Some(Duration::from_secs(2)));
///
/// assert_eq!(spec.name(), "api");
/// assert_eq!(spec.attempts(), 3);
/// ```
#[derive(Clone)]
pub struct ComponentSpec {
    component: ComponentRef,
    attempts: u32,
    backoff: BackoffPolicy,
    attempt_timeout: Option<Duration>,
}

impl ComponentSpec {
    /// Single attempt, default backoff, no per-attempt timeout.
    pub fn new(component: ComponentRef) -> Self {
        Self {
            component,
            attempts: 1,
            backoff: BackoffPolicy::default(),
            attempt_timeout: None,
        }
    }

    /// Inherits attempts/backoff/timeout from the launcher config.
    pub fn with_defaults(component: ComponentRef, cfg: &LaunchConfig) -> Self {
        Self {
            component,
            attempts: cfg.attempts.max(1),
            backoff: cfg.backoff,
            attempt_timeout: cfg.default_attempt_timeout(),
        }
    }

    /// Returns the component.
    pub fn component(&self) -> &ComponentRef {
        &self.component
    }

    /// Convenience: returns the component name.
    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// Maximum number of init attempts (at least 1).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the backoff policy.
    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Returns the per-attempt timeout, if configured.
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Sets the attempt budget (`0` is treated as `1`).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentError, ComponentFn};
    use tokio_util::sync::CancellationToken;

    fn noop() -> ComponentRef {
        ComponentFn::arc("noop", |_ctx: CancellationToken| async {
            Ok::<_, ComponentError>(())
        })
    }

    #[test]
    fn defaults_follow_config_sentinels() {
        let cfg = LaunchConfig {
            attempts: 0,
            attempt_timeout: Duration::ZERO,
            ..LaunchConfig::default()
        };
        let spec = ComponentSpec::with_defaults(noop(), &cfg);
        assert_eq!(spec.attempts(), 1);
        assert_eq!(spec.attempt_timeout(), None);
    }

    #[test]
    fn zero_attempts_is_one() {
        assert_eq!(ComponentSpec::new(noop()).with_attempts(0).attempts(), 1);
    }
}
