//! Startup configuration for the logger
//!
//! The host resolves these values once (from its own config file, the
//! environment, or both) and builds the logger from them. Nothing here is
//! consulted again after [`Logger`] construction.

use crate::core::{LogLevel, Logger, LoggerBuilder, LoggerError, Result, TimestampFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the threshold, by name or rank
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Environment variable holding the log file path
pub const LOG_FILE_ENV: &str = "LOG_FILE";

const DEFAULT_LOG_FILE: &str = "task-bridge-server.log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub path: PathBuf,
    /// Use a writer thread with this queue size instead of direct writes
    pub queue_capacity: Option<usize>,
    pub timestamp_format: TimestampFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            path: std::env::temp_dir().join(DEFAULT_LOG_FILE),
            queue_capacity: None,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `LOG_LEVEL` and `LOG_FILE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.level = level
                .parse()
                .map_err(|e: String| LoggerError::config(LOG_LEVEL_ENV, e))?;
        }

        if let Some(path) = lookup(LOG_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Parse a JSON config section; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn builder(&self) -> LoggerBuilder {
        let builder = Logger::builder()
            .min_level(self.level)
            .path(self.path.clone())
            .timestamp_format(self.timestamp_format);

        match self.queue_capacity {
            Some(capacity) => builder.queued(capacity),
            None => builder,
        }
    }
}

impl Logger {
    /// Build a logger from resolved startup configuration
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        config.builder().build()
    }
}
