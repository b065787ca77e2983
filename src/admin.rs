//! Administrative shutdown trigger.
//!
//! Reads line-oriented commands and turns `stop [message]` into a shutdown
//! reason. Used when the coordinator has been taken over, so that an
//! operator console replaces OS signals as the source of shutdown.

use crate::stopper::{Reason, Trigger};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// Reason used for a bare `stop` command.
pub const DEFAULT_STOP_REASON: &str = "admin stop";

/// Reason used when the command stream ends.
pub const INPUT_CLOSED_REASON: &str = "admin input closed";

/// Parse a single admin command line.
///
/// Returns the shutdown reason for a `stop` command, `None` for anything
/// else.
pub fn parse_command(line: &str) -> Option<Reason> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    if parts.next()? != "stop" {
        return None;
    }

    let reason = match parts.next().map(str::trim) {
        Some(message) if !message.is_empty() => Reason::new(message),
        _ => Reason::new(DEFAULT_STOP_REASON),
    };
    Some(reason)
}

/// Read commands until a `stop` arrives or the input ends, then deliver
/// the reason through `trigger`.
pub async fn run_admin<R>(reader: R, trigger: Trigger)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    let reason = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reason) = parse_command(&line) {
                    break reason;
                }
                if !line.trim().is_empty() {
                    warn!(command = %line.trim(), "unknown admin command");
                }
            }
            Ok(None) => break Reason::new(INPUT_CLOSED_REASON),
            Err(e) => {
                warn!(error = %e, "failed to read admin input");
                break Reason::new(INPUT_CLOSED_REASON);
            }
        }
    };

    if trigger.trigger(reason.clone()) {
        info!(reason = %reason, "admin requested shutdown");
    }
}
