//! The single-slot trigger sink and its read-only wait point.
//!
//! The slot holds at most one [`Reason`]. The first write wins and stays
//! readable for every current and future reader; later writes are dropped.

use crate::stopper::Reason;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type Slot = Option<Reason>;

/// Create a linked write/read pair over an empty slot.
pub(crate) fn sink() -> (Trigger, Stopped) {
    let (tx, rx) = watch::channel(None);
    (
        Trigger { tx: Arc::new(tx) },
        Stopped { rx: Some(rx) },
    )
}

/// Write-capable handle to the trigger sink.
///
/// Returned by [`Coordinator::take_over`](crate::stopper::Coordinator::take_over)
/// to hand exclusive control of shutdown to the caller. It is deliberately
/// not `Clone`: whoever holds it is the only producer of reasons.
#[derive(Debug)]
pub struct Trigger {
    tx: Arc<watch::Sender<Slot>>,
}

impl Trigger {
    /// Deliver a shutdown reason.
    ///
    /// Returns `true` if this call filled the slot. Returns `false` if a
    /// reason had already been delivered, in which case `reason` is dropped.
    pub fn trigger(&self, reason: impl Into<Reason>) -> bool {
        let reason = reason.into();
        self.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
            true
        })
    }

    /// Check whether a reason has been delivered.
    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Handle for the coordinator's own signal forwarder.
    pub(crate) fn share(&self) -> Trigger {
        Trigger {
            tx: Arc::clone(&self.tx),
        }
    }
}

/// Read-only wait point for the shutdown reason.
///
/// Clone freely; every clone observes the same reason. Reading never
/// consumes the stored value.
#[derive(Clone, Debug)]
pub struct Stopped {
    rx: Option<watch::Receiver<Slot>>,
}

impl Stopped {
    /// A wait point with no sink behind it. It never yields a reason.
    pub(crate) fn detached() -> Self {
        Self { rx: None }
    }

    /// Wait until a reason is delivered.
    ///
    /// Resolves immediately if a reason is already stored. Resolves with
    /// `None` if every writer went away without delivering one. A detached
    /// wait point (taken before the coordinator was started) never resolves.
    pub async fn wait(&self) -> Option<Reason> {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };

        let mut rx = rx.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            // Closed without a value: every writer is gone
            Err(_) => None,
        }
    }

    /// Wait for a reason, giving up after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Option<Reason> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .ok()
            .flatten()
    }

    /// Get the delivered reason without waiting.
    pub fn reason(&self) -> Option<Reason> {
        self.rx.as_ref().and_then(|rx| rx.borrow().clone())
    }

    /// Check whether a reason has been delivered.
    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| rx.borrow().is_some())
    }
}
