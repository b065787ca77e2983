//! Logging initialization and configuration.

use crate::config::LogFormat;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
///
/// # Arguments
///
/// * `level` - Log level filter (e.g., "info", "debug")
/// * `format` - Log output format (json or pretty)
pub fn init_logging(level: &str, format: &LogFormat) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(level));

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
