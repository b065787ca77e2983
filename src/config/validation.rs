//! Configuration validation.

use crate::config::Config;
use std::time::Duration;

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - A non-zero wait timeout when one is set
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    // A zero timeout would give up before anything could be delivered
    if config.shutdown.wait_timeout == Some(Duration::ZERO) {
        errors.push("shutdown wait_timeout must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
