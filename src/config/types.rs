//! Configuration data types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Shutdown coordination settings
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Json,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Where the shutdown reason comes from.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownMode {
    /// SIGINT / SIGTERM observed by the coordinator
    #[default]
    Signals,
    /// An administrative trigger replaces signal handling
    Takeover,
}

/// Shutdown coordination settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// Which producer owns the shutdown trigger
    #[serde(default)]
    pub mode: ShutdownMode,

    /// Give up waiting for a reason after this long (unbounded if unset)
    #[serde(default, with = "option_humantime_serde")]
    pub wait_timeout: Option<Duration>,

    /// Time allowed for draining once a reason has arrived
    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            mode: ShutdownMode::default(),
            wait_timeout: None,
            grace_period: default_grace_period(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5)
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Custom serde module for optional humantime durations.
mod option_humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => {
                let s = humantime::format_duration(*d).to_string();
                serializer.serialize_some(&s)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let d = humantime::parse_duration(&s).map_err(serde::de::Error::custom)?;
                Ok(Some(d))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.global.log_level, "info");
        assert_eq!(config.shutdown.mode, ShutdownMode::Signals);
        assert_eq!(config.shutdown.wait_timeout, None);
        assert_eq!(config.shutdown.grace_period, Duration::from_secs(5));
    }

    #[test]
    fn test_shutdown_mode_serde() {
        let mode: ShutdownMode = serde_yaml::from_str("takeover").unwrap();
        assert_eq!(mode, ShutdownMode::Takeover);

        let mode: ShutdownMode = serde_yaml::from_str("signals").unwrap();
        assert_eq!(mode, ShutdownMode::Signals);
    }

    #[test]
    fn test_shutdown_durations() {
        let yaml = "mode: takeover\nwait_timeout: 1m 30s\ngrace_period: 250ms\n";
        let shutdown: ShutdownConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(shutdown.wait_timeout, Some(Duration::from_secs(90)));
        assert_eq!(shutdown.grace_period, Duration::from_millis(250));
    }
}
