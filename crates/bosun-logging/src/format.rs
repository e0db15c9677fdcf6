//! Log level and output format

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;

use crate::error::{LoggingError, Result};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human readable lines
    Console,
}

impl LogFormat {
    /// Parse a format name; `text` is accepted as an alias of `console`
    pub fn parse(input: &str) -> Result<Self> {
        match input {
            "json" => Ok(LogFormat::Json),
            "console" | "text" => Ok(LogFormat::Console),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Console => "console",
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum level of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    ///
    /// `dpanic`, `panic` and `fatal` are accepted for compatibility and map to `error`.
    pub fn parse(input: &str) -> Result<Self> {
        match input.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "dpanic" | "panic" | "fatal" => Ok(LogLevel::Error),
            _ => Err(LoggingError::InvalidLevel(input.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse("console").unwrap(), LogFormat::Console);
        assert_eq!(LogFormat::parse("text").unwrap(), LogFormat::Console);
    }

    #[test]
    fn test_parse_format_invalid() {
        let err = LogFormat::parse("xml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "given log format: xml, doesn't match with any of [json console]"
        );
        assert!(LogFormat::parse("").is_err());
        assert!(LogFormat::parse("JSON").is_err());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(LogLevel::parse("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse("INFO").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::parse("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::parse("fatal").unwrap(), LogLevel::Error);
        assert!(LogLevel::parse("trace").is_err());
        assert!(LogLevel::parse("").is_err());
    }

    #[test]
    fn test_level_ordering_and_filter() {
        assert!(LogLevel::Debug < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_level_filter(), LevelFilter::WARN);
        assert_eq!("error".parse::<LogLevel>().unwrap().to_string(), "error");
    }
}
