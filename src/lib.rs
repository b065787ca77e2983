//! rustop - exactly-once shutdown coordination for long-running services
//!
//! This crate provides:
//! - A shutdown coordinator that turns SIGINT/SIGTERM into a single reason
//! - Exclusive takeover of the shutdown trigger by an external owner
//! - A broadcast wait point that any number of tasks can await
//! - An administrative line-command trigger for takeover mode

pub mod admin;
pub mod config;
pub mod stopper;
pub mod util;

pub use config::Config;
pub use stopper::{Coordinator, Reason, Stopped, Stopper, StopperError, Trigger};
