//! Shutdown coordination.
//!
//! A [`Coordinator`] turns the first OS termination signal, or a single
//! programmatic request, into a [`Reason`] that any number of waiters can
//! observe through the [`Stopped`] wait point.

mod coordinator;
mod error;
mod reason;
mod signals;
mod trigger;

pub use coordinator::{Coordinator, CoordinatorState, Stopper};
pub use error::{Owner, StopperError};
pub use reason::Reason;
pub use signals::Signal;
pub use trigger::{Stopped, Trigger};
