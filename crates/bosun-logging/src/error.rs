//! Error types for bosun-logging

use std::path::PathBuf;

use thiserror::Error;

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Errors that can occur while configuring logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("given log format: {0}, doesn't match with any of [json console]")]
    InvalidFormat(String),

    #[error("given log level: {0}, doesn't match with any of [debug info warn error]")]
    InvalidLevel(String),

    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(String),

    #[error("failed to reload log level: {0}")]
    Reload(#[from] tracing_subscriber::reload::Error),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("config watcher stopped unexpectedly")]
    WatcherClosed,
}
