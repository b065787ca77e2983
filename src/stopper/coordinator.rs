//! The shutdown coordinator state machine.

use crate::stopper::signals::SignalForwarder;
use crate::stopper::trigger::sink;
use crate::stopper::{Owner, Stopped, StopperError, Trigger};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Lets a component replace OS-signal driven shutdown with its own trigger.
pub trait Stopper {
    /// Take exclusive ownership of the shutdown trigger.
    ///
    /// Fails with [`StopperError::OwnershipConflict`] if the trigger sink
    /// already exists.
    fn take_over(&self) -> Result<Trigger, StopperError>;
}

/// Lifecycle state of a [`Coordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No trigger sink yet.
    Idle,
    /// Forwarding OS signals into the sink.
    Started,
    /// An external owner produces the reason; signals are not observed.
    TakenOver,
    /// Was started, signal observation has since been disabled.
    Stopped,
}

/// Unifies OS termination signals and programmatic shutdown requests into a
/// single reason delivered exactly once.
///
/// The trigger sink is created at most once, by whichever of
/// [`start`](Coordinator::start) or [`take_over`](Coordinator::take_over)
/// runs first. That call fixes who may write to it for the lifetime of the
/// coordinator.
pub struct Coordinator {
    inner: Mutex<Inner>,
}

struct Inner {
    owner: Option<Owner>,
    /// Wait point handed to readers; detached until the sink exists.
    stopped: Stopped,
    /// Held while signal-owned so the wait point outlives `stop()`.
    trigger: Option<Trigger>,
    forwarder: Option<SignalForwarder>,
    torn_down: bool,
}

impl Coordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                owner: None,
                stopped: Stopped::detached(),
                trigger: None,
                forwarder: None,
                torn_down: false,
            }),
        }
    }

    /// Begin forwarding SIGINT and SIGTERM into the trigger sink.
    ///
    /// Must be called from within a Tokio runtime with IO enabled; otherwise
    /// it fails with [`StopperError::NoRuntime`] or
    /// [`StopperError::NoSignalDriver`] and the coordinator stays idle.
    /// Calling it again after a successful start is a no-op.
    pub fn start(&self) -> Result<(), StopperError> {
        let mut inner = self.inner.lock();

        match inner.owner {
            Some(Owner::Signals) => {
                debug!("shutdown coordinator already started");
                return Ok(());
            }
            Some(owner) => return Err(StopperError::OwnershipConflict { owner }),
            None => {}
        }

        let (trigger, stopped) = sink();
        let forwarder = SignalForwarder::spawn(trigger.share())?;

        inner.owner = Some(Owner::Signals);
        inner.stopped = stopped;
        inner.trigger = Some(trigger);
        inner.forwarder = Some(forwarder);

        info!("shutdown coordinator started, watching SIGINT and SIGTERM");
        Ok(())
    }

    /// Stop observing OS signals.
    ///
    /// The wait point stays valid and keeps any reason already delivered.
    /// Safe to call before `start()` and more than once.
    ///
    /// Tokio never restores a signal's default disposition once a handler is
    /// installed, so after `stop()` SIGINT and SIGTERM are ignored for the
    /// rest of the process instead of terminating it.
    pub fn stop(&self) -> Result<(), StopperError> {
        let mut inner = self.inner.lock();

        if let Some(forwarder) = inner.forwarder.take() {
            forwarder.stop();
            inner.torn_down = true;
            info!("shutdown coordinator stopped watching signals");
        }

        Ok(())
    }

    /// Get the read-only wait point.
    ///
    /// Taken before `start()` or `take_over()`, the returned wait point never
    /// yields a reason.
    pub fn stopped(&self) -> Stopped {
        self.inner.lock().stopped.clone()
    }

    /// Hand exclusive write ownership of the trigger sink to the caller.
    ///
    /// OS signals are not forwarded in this mode.
    pub fn take_over(&self) -> Result<Trigger, StopperError> {
        let mut inner = self.inner.lock();

        if let Some(owner) = inner.owner {
            return Err(StopperError::OwnershipConflict { owner });
        }

        let (trigger, stopped) = sink();
        inner.owner = Some(Owner::External);
        inner.stopped = stopped;

        info!("shutdown trigger taken over by external owner");
        Ok(trigger)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        let inner = self.inner.lock();
        match inner.owner {
            None => CoordinatorState::Idle,
            Some(Owner::External) => CoordinatorState::TakenOver,
            Some(Owner::Signals) if inner.torn_down => CoordinatorState::Stopped,
            Some(Owner::Signals) => CoordinatorState::Started,
        }
    }

    /// Whether OS signals are currently being forwarded.
    pub fn is_listening(&self) -> bool {
        self.inner.lock().forwarder.is_some()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopper for Coordinator {
    fn take_over(&self) -> Result<Trigger, StopperError> {
        Coordinator::take_over(self)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("listening", &self.is_listening())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stopper::Reason;
    use std::time::Duration;

    #[test]
    fn test_new_is_idle() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(!coordinator.is_listening());
        assert!(coordinator.stopped().reason().is_none());
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let coordinator = Coordinator::new();
        coordinator.start().unwrap();
        let first = coordinator.stopped();

        coordinator.start().unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Started);
        assert!(coordinator.is_listening());

        // Same sink behind both wait points
        let trigger = coordinator.inner.lock().trigger.as_ref().unwrap().share();
        trigger.trigger("probe");
        assert_eq!(first.reason(), Some(Reason::new("probe")));
        assert_eq!(coordinator.stopped().reason(), Some(Reason::new("probe")));
    }

    #[tokio::test]
    async fn test_start_after_take_over_conflicts() {
        let coordinator = Coordinator::new();
        let _trigger = coordinator.take_over().unwrap();

        let err = coordinator.start().unwrap_err();
        assert!(matches!(
            err,
            StopperError::OwnershipConflict {
                owner: Owner::External
            }
        ));
        assert_eq!(coordinator.state(), CoordinatorState::TakenOver);
        assert!(!coordinator.is_listening());
    }

    #[tokio::test]
    async fn test_take_over_after_start_conflicts() {
        let coordinator = Coordinator::new();
        coordinator.start().unwrap();

        let err = coordinator.take_over().unwrap_err();
        assert!(matches!(
            err,
            StopperError::OwnershipConflict {
                owner: Owner::Signals
            }
        ));
    }

    #[test]
    fn test_take_over_twice_conflicts() {
        let coordinator = Coordinator::new();
        let _trigger = coordinator.take_over().unwrap();
        assert!(coordinator.take_over().is_err());
    }

    #[test]
    fn test_start_without_runtime_stays_idle() {
        let coordinator = Coordinator::new();
        let err = coordinator.start().unwrap_err();

        assert!(err.is_setup_failure());
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        // Nothing was committed, so ownership is still up for grabs
        assert!(coordinator.take_over().is_ok());
    }

    #[test]
    fn test_start_without_signal_driver_stays_idle() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let coordinator = Coordinator::new();

        let err = runtime.block_on(async { coordinator.start() }).unwrap_err();

        assert!(matches!(err, StopperError::NoSignalDriver));
        assert!(err.is_setup_failure());
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(coordinator.take_over().is_ok());
    }

    #[test]
    fn test_stop_before_start() {
        let coordinator = Coordinator::new();
        assert!(coordinator.stop().is_ok());
        assert!(coordinator.stop().is_ok());
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
    }

    #[tokio::test]
    async fn test_stop_keeps_wait_point() {
        let coordinator = Coordinator::new();
        coordinator.start().unwrap();
        let stopped = coordinator.stopped();

        coordinator.stop().unwrap();
        coordinator.stop().unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Stopped);
        assert!(!coordinator.is_listening());

        // Still open: waiting neither panics nor resolves with None
        let reason = stopped.wait_timeout(Duration::from_millis(20)).await;
        assert!(reason.is_none());

        // Restarting a stopped coordinator does not recreate anything
        coordinator.start().unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Stopped);
    }

    #[tokio::test]
    async fn test_take_over_delivers_reason() {
        let coordinator = Coordinator::new();
        let trigger = Stopper::take_over(&coordinator).unwrap();
        let stopped = coordinator.stopped();

        let waiter = tokio::spawn(async move { stopped.wait().await });
        assert!(trigger.trigger("admin stop"));

        assert_eq!(waiter.await.unwrap(), Some(Reason::new("admin stop")));
    }

    #[test]
    fn test_wait_point_before_sink_is_detached() {
        let coordinator = Coordinator::new();
        let early = coordinator.stopped();
        let trigger = coordinator.take_over().unwrap();

        trigger.trigger("late");
        assert!(early.reason().is_none());
        assert_eq!(coordinator.stopped().reason(), Some(Reason::new("late")));
    }
}
