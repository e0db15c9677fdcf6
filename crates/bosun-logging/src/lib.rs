//! Logging setup for Bosun
//!
//! Configuration comes from `<PREFIX>_LOGLEVEL` / `<PREFIX>_LOGFORMAT` or a YAML
//! file with `logLevel` / `logFormat` keys. [`init`] installs a `tracing`
//! subscriber whose level can be changed at runtime through the returned
//! [`LogHandle`]; [`watch_config`] keeps it in sync with a config file.
//!
//! ```no_run
//! use bosun_logging::{LogConfig, init};
//!
//! let handle = init(&LogConfig::from_env("BOSUN")).unwrap();
//! # let _ = handle;
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod subscriber;
pub mod watcher;

pub use config::LogConfig;
pub use error::{LoggingError, Result};
pub use format::{LogFormat, LogLevel};
pub use subscriber::{LogHandle, Reconfigured, build, init};
pub use watcher::{NOTIFICATION_DELAY, WatchExit, watch_config};
