//! Logging configuration from the environment or a YAML file

use std::path::Path;

use serde::Deserialize;

use crate::error::{LoggingError, Result};
use crate::format::{LogFormat, LogLevel};

/// Raw logging settings, validated on use
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl LogConfig {
    /// Read `<PREFIX>_LOGLEVEL` and `<PREFIX>_LOGFORMAT`, falling back to defaults
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            let key = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}_{name}")
            };
            lookup(&key).filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            log_level: var("LOGLEVEL").unwrap_or(defaults.log_level),
            log_format: var("LOGFORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Load from a YAML file with `logLevel` and `logFormat` keys
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| LoggingError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&data).map_err(|source| LoggingError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn level(&self) -> Result<LogLevel> {
        LogLevel::parse(&self.log_level)
    }

    pub fn format(&self) -> Result<LogFormat> {
        LogFormat::parse(&self.log_format)
    }
}
