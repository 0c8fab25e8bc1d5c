//! Error types used by the readyvisor runtime, components and external collaborators.
//!
//! - [`ComponentError`] - raised by a single component's initialization.
//! - [`StartupError`] - the error carried by a non-ready startup outcome or a report.
//! - [`RegistryError`] - programmer errors detected while registering components.
//! - [`SettleError`] - a readiness token was settled more than once.
//! - [`UpdateError`] - raised by an update check.
//! - [`SinkError`] - raised by an external report sink.
//! - [`RuntimeError`] - raised by the launcher itself.
//!
//! All types provide `as_label` (stable snake_case, for logs/metrics) and `as_message`.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by component initialization.
///
/// Some errors are retryable (`Timeout`, `Fail`), others settle the token immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// One init attempt exceeded its timeout.
    #[error("init timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (never retried).
    #[error("fatal init error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Init failed but may succeed if retried.
    #[error("init failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Init was cancelled because the launcher is shutting down.
    #[error("context cancelled")]
    Canceled,

    /// The owner dropped its settler without settling (init task panicked or was dropped).
    #[error("component abandoned its readiness token")]
    Abandoned,
}

impl ComponentError {
    /// Shorthand for a retryable failure.
    pub fn fail(error: impl Into<String>) -> Self {
        ComponentError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for a fatal failure.
    pub fn fatal(error: impl Into<String>) -> Self {
        ComponentError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use readyvisor::ComponentError;
    /// use std::time::Duration;
    ///
    /// let err = ComponentError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "component_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Timeout { .. } => "component_timeout",
            ComponentError::Fatal { .. } => "component_fatal",
            ComponentError::Fail { .. } => "component_failed",
            ComponentError::Canceled => "component_canceled",
            ComponentError::Abandoned => "component_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ComponentError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            ComponentError::Fatal { error } => format!("fatal: {error}"),
            ComponentError::Fail { error } => format!("error: {error}"),
            ComponentError::Canceled => "context cancelled".to_string(),
            ComponentError::Abandoned => "abandoned".to_string(),
        }
    }

    /// Indicates whether another init attempt may succeed.
    ///
    /// Returns `true` for [`ComponentError::Fail`] and [`ComponentError::Timeout`].
    ///
    /// # Example
    /// ```
    /// use readyvisor::ComponentError;
    ///
    /// assert!(ComponentError::fail("connection refused").is_retryable());
    /// assert!(!ComponentError::fatal("bad credentials").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComponentError::Fail { .. } | ComponentError::Timeout { .. }
        )
    }
}

/// # Errors describing why startup is not (yet) ready.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// The deadline elapsed before every component became ready.
    #[error("startup deadline {deadline:?} exceeded; pending: {pending:?}")]
    Timeout {
        /// The configured deadline.
        deadline: Duration,
        /// Components still pending when the deadline fired (registration order).
        pending: Vec<String>,
    },

    /// A component failed to initialize.
    #[error("component {component:?} failed: {source}")]
    Component {
        /// Name of the first component observed failing.
        component: String,
        /// The component's error.
        #[source]
        source: ComponentError,
    },

    /// Every component became ready, but only after the deadline had been reported.
    #[error("initialized after deadline {deadline:?} (took {elapsed:?})")]
    InitializedLate {
        /// The configured deadline.
        deadline: Duration,
        /// Time from startup begin to readiness.
        elapsed: Duration,
    },
}

impl StartupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupError::Timeout { .. } => "startup_timeout",
            StartupError::Component { .. } => "startup_component_failed",
            StartupError::InitializedLate { .. } => "startup_initialized_late",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StartupError::Timeout { deadline, pending } => {
                format!("deadline {deadline:?} exceeded; pending components={pending:?}")
            }
            StartupError::Component { component, source } => {
                format!("component={component} {}", source.as_message())
            }
            StartupError::InitializedLate { deadline, elapsed } => {
                format!("ready after {elapsed:?}; deadline was {deadline:?}")
            }
        }
    }

    /// Returns `true` for the deadline variant (the "is timeout" marker on reports).
    pub fn is_timeout(&self) -> bool {
        matches!(self, StartupError::Timeout { .. })
    }
}

/// # Programmer errors raised synchronously by the component registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A component with this name is already registered.
    #[error("component {name:?} is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Registration attempted after startup began.
    #[error("registry is sealed; component {name:?} registered after startup began")]
    Sealed {
        /// The rejected name.
        name: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateName { .. } => "registry_duplicate_name",
            RegistryError::Sealed { .. } => "registry_sealed",
        }
    }
}

/// # A readiness token was settled twice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettleError {
    /// The token had already left `Pending`; the second attempt was ignored.
    #[error("readiness token {name:?} already settled")]
    AlreadySettled {
        /// Owning component name.
        name: String,
    },
}

/// # Errors produced by an update check.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The update mechanism is not available in this environment. Disables polling.
    #[error("update mechanism unsupported: {reason}")]
    Unsupported {
        /// Why the capability is missing.
        reason: String,
    },

    /// One check failed. Polling continues on schedule.
    #[error("update check failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl UpdateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            UpdateError::Unsupported { .. } => "update_unsupported",
            UpdateError::Failed { .. } => "update_failed",
        }
    }

    /// Returns `true` if polling must stop permanently.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, UpdateError::Unsupported { .. })
    }
}

/// # Errors produced by an external report sink.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink could not deliver the report.
    #[error("report delivery failed: {error}")]
    Delivery {
        /// The underlying error message.
        error: String,
    },
}

/// # Errors produced by the launcher itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Startup was requested more than once.
    #[error("startup already started")]
    AlreadyStarted,

    /// OS signal listeners could not be installed.
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use readyvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadyStarted.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ComponentError::Timeout { timeout: Duration::from_millis(5) }.is_retryable());
        assert!(ComponentError::fail("x").is_retryable());
        assert!(!ComponentError::fatal("x").is_retryable());
        assert!(!ComponentError::Canceled.is_retryable());
        assert!(!ComponentError::Abandoned.is_retryable());
    }

    #[test]
    fn timeout_marker_and_message() {
        let err = StartupError::Timeout {
            deadline: Duration::from_secs(10),
            pending: vec!["events".into()],
        };
        assert!(err.is_timeout());
        assert_eq!(err.as_label(), "startup_timeout");
        assert!(err.as_message().contains("events"));

        let failed = StartupError::Component {
            component: "api".into(),
            source: ComponentError::fail("refused"),
        };
        assert!(!failed.is_timeout());
        assert_eq!(failed.to_string(), "component \"api\" failed: init failed: refused");
    }
}
