//! Shutdown coordination errors.

use crate::stopper::Signal;
use thiserror::Error;

/// Which producer holds write ownership of the trigger sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The coordinator's own signal forwarder, after `start()`.
    Signals,
    /// An external caller, after `take_over()`.
    External,
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Signals => write!(f, "signal forwarder"),
            Owner::External => write!(f, "external owner"),
        }
    }
}

/// Errors that can occur while establishing shutdown ownership.
#[derive(Debug, Error)]
pub enum StopperError {
    #[error("stopper already started: trigger is owned by the {owner}")]
    OwnershipConflict { owner: Owner },

    #[error("no tokio runtime available to run the signal forwarder")]
    NoRuntime,

    #[error("tokio runtime has no signal driver; build it with IO enabled")]
    NoSignalDriver,

    #[error("failed to register {signal} handler: {source}")]
    SignalRegistration {
        signal: Signal,
        #[source]
        source: std::io::Error,
    },
}

impl StopperError {
    /// Whether this error came from setting up signal observation, as
    /// opposed to calling `start()`/`take_over()` out of order.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            StopperError::NoRuntime
                | StopperError::NoSignalDriver
                | StopperError::SignalRegistration { .. }
        )
    }
}
