//! Configuration file loading.

use crate::config::{validate_config, Config};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a YAML file.
///
/// Reads the file, parses the YAML, and validates the result. An empty
/// file yields the default configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_config(&contents)
}

/// Parse and validate configuration from a YAML string.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = if contents.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(contents)?
    };

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShutdownMode;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
global:
  log_level: debug
  log_format: pretty

shutdown:
  mode: takeover
  wait_timeout: 10s
  grace_period: 2s
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.shutdown.mode, ShutdownMode::Takeover);
        assert_eq!(config.shutdown.wait_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.shutdown.grace_period, Duration::from_secs(2));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.shutdown.mode, ShutdownMode::Signals);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.yaml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ReadError(_)));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let result = parse_config("not: valid: yaml: {{{}}}");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_bad_duration() {
        let result = parse_config("shutdown:\n  grace_period: soon\n");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_invalid_values() {
        let result = parse_config("global:\n  log_level: loud\n");
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }
}
