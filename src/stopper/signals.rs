//! OS termination signal observation and forwarding.

use crate::stopper::{Reason, StopperError, Trigger};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The termination signals the coordinator subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl Signal {
    /// Symbolic name of the signal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background task forwarding observed signals into a trigger sink.
///
/// Only the first signal fills the sink. Later ones are dropped.
pub(crate) struct SignalForwarder {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SignalForwarder {
    /// Register for SIGINT and SIGTERM and spawn the forwarding loop on the
    /// current runtime.
    pub(crate) fn spawn(trigger: Trigger) -> Result<Self, StopperError> {
        let handle = Handle::try_current().map_err(|_| StopperError::NoRuntime)?;
        let mut listener = SignalListener::register()?;
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        let task = handle.spawn(async move {
            loop {
                let signal = tokio::select! {
                    biased;

                    // Fires on stop() and when the forwarder is dropped
                    _ = &mut cancelled => break,

                    signal = listener.recv() => match signal {
                        Some(signal) => signal,
                        None => break,
                    },
                };

                if trigger.trigger(Reason::from(signal)) {
                    info!(signal = %signal, "shutdown signal received");
                } else {
                    debug!(signal = %signal, "shutdown already triggered, dropping signal");
                }
            }

            debug!("signal forwarder exiting");
        });

        debug!("signal forwarder started");
        Ok(Self { cancel, task })
    }

    /// Stop observing signals. Anything already delivered stays in the sink.
    pub(crate) fn stop(self) {
        let _ = self.cancel.send(());
        debug!(finished = self.task.is_finished(), "signal forwarder stopping");
    }
}

/// Run a tokio signal registration, turning both its error and its
/// missing-driver panic into a [`StopperError`].
///
/// Tokio panics rather than erroring when the current runtime was built
/// without the IO driver. The default panic hook still prints that message.
fn register_with<T>(
    signal: Signal,
    register: impl FnOnce() -> std::io::Result<T>,
) -> Result<T, StopperError> {
    match catch_unwind(AssertUnwindSafe(register)) {
        Ok(result) => result.map_err(|source| StopperError::SignalRegistration { signal, source }),
        Err(_) => Err(StopperError::NoSignalDriver),
    }
}

#[cfg(unix)]
struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn register() -> Result<Self, StopperError> {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = register_with(Signal::Interrupt, || signal(SignalKind::interrupt()))?;
        let terminate = register_with(Signal::Terminate, || signal(SignalKind::terminate()))?;

        Ok(Self {
            interrupt,
            terminate,
        })
    }

    /// Next observed signal, or `None` once both sources are closed.
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(Signal::Interrupt),
            Some(()) = self.terminate.recv() => Some(Signal::Terminate),
            else => None,
        }
    }
}

#[cfg(windows)]
struct SignalListener {
    ctrl_c: tokio::signal::windows::CtrlC,
    ctrl_close: tokio::signal::windows::CtrlClose,
}

#[cfg(windows)]
impl SignalListener {
    fn register() -> Result<Self, StopperError> {
        use tokio::signal::windows::{ctrl_c, ctrl_close};

        let ctrl_c = register_with(Signal::Interrupt, ctrl_c)?;
        let ctrl_close = register_with(Signal::Terminate, ctrl_close)?;

        Ok(Self { ctrl_c, ctrl_close })
    }

    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.ctrl_c.recv() => Some(Signal::Interrupt),
            Some(()) = self.ctrl_close.recv() => Some(Signal::Terminate),
            else => None,
        }
    }
}
