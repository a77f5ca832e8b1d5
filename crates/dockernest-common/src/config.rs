//! Global configuration model for DockerNest.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration shared by the runtime adapter, registry, and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockernestConfig {
    /// Runtime daemon endpoint (`unix://`, `tcp://`, or `http://`).
    /// `None` uses the platform's local defaults.
    pub docker_host: Option<String>,
    /// Upper bound on each runtime call, in seconds.
    pub runtime_timeout_secs: u64,
    /// Path to the registry database.
    pub database_path: PathBuf,
    /// Network new workloads join when the request names none.
    pub default_network: String,
    /// Number of log lines returned by a log fetch.
    pub log_tail_lines: usize,
}

impl DockernestConfig {
    /// Returns the runtime call timeout as a [`Duration`].
    #[must_use]
    pub const fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime_timeout_secs)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout or log tail is zero, or the default
    /// network name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime_timeout_secs == 0 {
            return Err(ConfigError {
                message: "runtime timeout must be at least one second".to_string(),
            });
        }
        if self.default_network.trim().is_empty() {
            return Err(ConfigError {
                message: "default network name must not be empty".to_string(),
            });
        }
        if self.log_tail_lines == 0 {
            return Err(ConfigError {
                message: "log tail must be at least one line".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DockernestConfig {
    fn default() -> Self {
        Self {
            docker_host: None,
            runtime_timeout_secs: crate::constants::DEFAULT_RUNTIME_TIMEOUT_SECS,
            database_path: crate::constants::default_database_path(),
            default_network: crate::constants::DEFAULT_NETWORK.to_string(),
            log_tail_lines: crate::constants::DEFAULT_LOG_TAIL_LINES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DockernestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_network, "dockernest-net");
        assert_eq!(config.log_tail_lines, 50);
        assert_eq!(config.runtime_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = DockernestConfig {
            runtime_timeout_secs: 0,
            ..DockernestConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("timeout"));
    }

    #[test]
    fn blank_network_is_rejected() {
        let config = DockernestConfig {
            default_network: "  ".into(),
            ..DockernestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DockernestConfig =
            serde_json::from_str(r#"{"docker_host":"tcp://10.0.0.2:2375"}"#).unwrap();
        assert_eq!(config.docker_host.as_deref(), Some("tcp://10.0.0.2:2375"));
        assert_eq!(config.log_tail_lines, 50);
    }
}
