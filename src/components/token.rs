//! # Readiness token: single-settlement handle for one component's init.
//!
//! A token is created as a pair:
//! - [`Settler`] - the write side, owned by the component (exactly one).
//! - [`ReadinessToken`] - cloneable read side, observed by the supervisor.
//!
//! ```text
//!            settle once
//! Settler ───────────────► watch<Readiness> ───► ReadinessToken (clone) ─► supervisor
//!   │                                        └──► ReadinessToken (clone) ─► state()
//!   └─ drop while Pending ⇒ Failed(Abandoned)
//! ```
//!
//! ## Rules
//! - `Pending → Ready` or `Pending → Failed`, never back.
//! - A second settle is a no-op returning [`SettleError::AlreadySettled`]; observers
//!   are not notified twice.
//! - Dropping a pending [`Settler`] fails the token with [`ComponentError::Abandoned`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{ComponentError, SettleError};

/// Current state of a readiness token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Init still running.
    Pending,
    /// Init succeeded.
    Ready,
    /// Init failed; terminal.
    Failed(ComponentError),
}

impl Readiness {
    /// Returns `true` once the token left `Pending`.
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Readiness::Pending)
    }
}

/// Observer side of a component's readiness.
#[derive(Clone, Debug)]
pub struct ReadinessToken {
    name: Arc<str>,
    rx: watch::Receiver<Readiness>,
}

/// Owner side of a component's readiness. Not cloneable.
#[derive(Debug)]
pub struct Settler {
    name: Arc<str>,
    tx: watch::Sender<Readiness>,
}

impl ReadinessToken {
    /// Creates a pending token for `name` together with its settler.
    ///
    /// # Example
    /// ```rust
    /// use readyvisor::{Readiness, ReadinessToken};
    ///
    /// let (settler, token) = ReadinessToken::pending("accounts");
    /// assert_eq!(token.state(), Readiness::Pending);
    ///
    /// settler.resolve().unwrap();
    /// assert!(settler.resolve().is_err()); // second settle is ignored
    /// assert_eq!(token.state(), Readiness::Ready);
    /// ```
    pub fn pending(name: impl Into<Arc<str>>) -> (Settler, ReadinessToken) {
        let name = name.into();
        let (tx, rx) = watch::channel(Readiness::Pending);
        (
            Settler {
                name: Arc::clone(&name),
                tx,
            },
            ReadinessToken { name, rx },
        )
    }

    /// Owning component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Synchronous snapshot of the current state.
    pub fn state(&self) -> Readiness {
        self.rx.borrow().clone()
    }

    /// Returns `true` once the token left `Pending`.
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_settled()
    }

    /// Waits for settlement. Returns immediately if already settled.
    pub async fn settled(&self) -> Result<(), ComponentError> {
        let mut rx = self.rx.clone();
        let state = match rx.wait_for(Readiness::is_settled).await {
            Ok(state) => state.clone(),
            // Unreachable in practice: `Settler::drop` settles before the sender goes away.
            Err(_closed) => return Err(ComponentError::Abandoned),
        };
        match state {
            Readiness::Ready => Ok(()),
            Readiness::Failed(err) => Err(err),
            Readiness::Pending => Err(ComponentError::Abandoned),
        }
    }
}

impl Settler {
    /// Owning component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settles the token `Ready`.
    pub fn resolve(&self) -> Result<(), SettleError> {
        self.settle(Readiness::Ready)
    }

    /// Settles the token `Failed(err)`.
    pub fn fail(&self, err: ComponentError) -> Result<(), SettleError> {
        self.settle(Readiness::Failed(err))
    }

    fn settle(&self, next: Readiness) -> Result<(), SettleError> {
        let applied = self.tx.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            *state = next;
            true
        });
        if applied {
            Ok(())
        } else {
            Err(SettleError::AlreadySettled {
                name: self.name.to_string(),
            })
        }
    }
}

impl Drop for Settler {
    fn drop(&mut self) {
        let _ = self.fail(ComponentError::Abandoned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn second_settle_is_rejected_and_state_kept() {
        let (settler, token) = ReadinessToken::pending("ui");
        settler.fail(ComponentError::fail("disk")).unwrap();

        let err = settler.resolve().unwrap_err();
        assert_eq!(err, SettleError::AlreadySettled { name: "ui".into() });
        assert_eq!(token.state(), Readiness::Failed(ComponentError::fail("disk")));
    }

    #[test]
    fn dropping_pending_settler_abandons() {
        let (settler, token) = ReadinessToken::pending("proxy");
        drop(settler);
        assert_eq!(token.state(), Readiness::Failed(ComponentError::Abandoned));
    }

    #[test]
    fn dropping_settled_settler_keeps_ready() {
        let (settler, token) = ReadinessToken::pending("proxy");
        settler.resolve().unwrap();
        drop(settler);
        assert_eq!(token.state(), Readiness::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_waits_for_owner() {
        let (settler, token) = ReadinessToken::pending("events");
        let observer = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            settler.resolve().unwrap();
        });

        assert!(!observer.is_settled());
        assert_eq!(observer.settled().await, Ok(()));
        assert_eq!(token.settled().await, Ok(()));
    }
}
