//! Configuration module
//!
//! Settings come from command-line flags and environment variables only;
//! nothing is read from or written to disk.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker count of zero
    #[error("worker thread count must be at least 1")]
    NoWorkers,

    /// Search timeout of zero seconds
    #[error("search timeout must be at least 1 second")]
    ZeroSearchTimeout,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Executor worker threads
    pub worker_threads: usize,
    /// Give up on a pending device search after this many seconds
    pub search_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            worker_threads: 2,
            search_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.search_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroSearchTimeout);
        }
        Ok(())
    }

    /// Search timeout as a duration
    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_secs.map(Duration::from_secs)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `sensorlink_core=debug`
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Flags shared by the GUI and CLI binaries
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Log filter directive
    #[arg(long = "log", env = "SENSORLINK_LOG", default_value = "info")]
    pub log_filter: String,

    /// Log as JSON lines
    #[arg(long, env = "SENSORLINK_LOG_JSON")]
    pub log_json: bool,

    /// Worker threads for connection attempts
    #[arg(long, env = "SENSORLINK_WORKERS", default_value_t = 2)]
    pub workers: usize,

    /// Abandon a device search after this many seconds
    #[arg(long, env = "SENSORLINK_SEARCH_TIMEOUT")]
    pub search_timeout: Option<u64>,
}

impl ConfigArgs {
    /// Build and validate the configuration
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            logging: LoggingConfig {
                filter: self.log_filter,
                json: self.log_json,
            },
            worker_threads: self.workers,
            search_timeout_secs: self.search_timeout,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search_timeout(), None);
    }

    #[test]
    fn test_flags_build_config() {
        let cli = TestCli::parse_from([
            "sensorlink",
            "--workers",
            "3",
            "--search-timeout",
            "10",
            "--log-json",
        ]);
        let config = cli.config.into_config().unwrap();
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.search_timeout(), Some(Duration::from_secs(10)));
        assert!(config.logging.json);
    }

    #[test]
    fn test_rejects_zero_values() {
        let cli = TestCli::parse_from(["sensorlink", "--workers", "0"]);
        assert_eq!(cli.config.into_config(), Err(ConfigError::NoWorkers));

        let cli = TestCli::parse_from(["sensorlink", "--search-timeout", "0"]);
        assert_eq!(cli.config.into_config(), Err(ConfigError::ZeroSearchTimeout));
    }
}
