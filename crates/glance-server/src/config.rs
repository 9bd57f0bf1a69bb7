//! Configuration for the glance server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (cache, engine limits, logging)
//! 2. .env file - local developer overrides
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Engine limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default systematic-sampling cap applied when a visualization does
    /// not set its own
    pub sample_size: usize,

    /// Row count above which aggregation and filtering move to the
    /// background worker
    pub worker_threshold_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            worker_threshold_rows: 50_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no config file exists
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(ttl) = std::env::var("GLANCE_CACHE_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                self.cache.ttl_secs = secs;
            }
        }
        if let Ok(size) = std::env::var("GLANCE_SAMPLE_SIZE") {
            if let Ok(n) = size.parse() {
                self.engine.sample_size = n;
            }
        }
        if let Ok(threshold) = std::env::var("GLANCE_WORKER_THRESHOLD") {
            if let Ok(n) = threshold.parse() {
                self.engine.worker_threshold_rows = n;
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.engine.sample_size, 1000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("GLANCE_CACHE_TTL_SECS", "60");
        std::env::set_var("GLANCE_SAMPLE_SIZE", "250");

        let config_yaml = r#"
cache:
  ttl_secs: 300
engine:
  sample_size: 1000
  worker_threshold_rows: 50000
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;
        let temp_file = std::env::temp_dir().join("glance_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.cache.ttl_secs, 60); // Overridden
        assert_eq!(config.engine.sample_size, 250); // Overridden
        assert_eq!(config.engine.worker_threshold_rows, 50_000);

        std::env::remove_var("GLANCE_CACHE_TTL_SECS");
        std::env::remove_var("GLANCE_SAMPLE_SIZE");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        // Parsed directly so concurrent env-override tests cannot interfere.
        let config: Config = serde_yaml::from_str("cache:\n  ttl_secs: 30\n").unwrap();
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.engine.worker_threshold_rows, 50_000);
        assert_eq!(config.logging.level, "info");
    }
}
