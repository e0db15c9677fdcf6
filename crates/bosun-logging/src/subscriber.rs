//! Subscriber setup with a reloadable level

use tracing::Subscriber;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, reload};

use crate::config::LogConfig;
use crate::error::{LoggingError, Result};
use crate::format::{LogFormat, LogLevel};

type FilterLayer = reload::Layer<EnvFilter, Registry>;
type FormatLayer = Box<dyn Layer<Layered<FilterLayer, Registry>> + Send + Sync>;

/// Outcome of applying a new configuration to a running subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconfigured {
    /// The level was applied in place
    LevelUpdated(LogLevel),
    /// The level was applied, but the output format can only change on restart
    RestartRequired { from: LogFormat, to: LogFormat },
}

/// Handle to a subscriber built by [`build`] or [`init`]
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    format: LogFormat,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl LogHandle {
    /// Format the subscriber was built with
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Current filter directives, e.g. `info`
    pub fn current_filter(&self) -> Result<String> {
        Ok(self.filter.with_current(|filter| filter.to_string())?)
    }

    /// Apply `config`; nothing changes if either field is invalid
    pub fn reconfigure(&self, config: &LogConfig) -> Result<Reconfigured> {
        let level = config.level()?;
        let format = config.format()?;

        self.set_level(level)?;

        if format != self.format {
            return Ok(Reconfigured::RestartRequired {
                from: self.format,
                to: format,
            });
        }
        Ok(Reconfigured::LevelUpdated(level))
    }

    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.filter.reload(level_filter(level))?;
        Ok(())
    }
}

fn level_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_str())
}

/// Build a subscriber for `config` without installing it
pub fn build(config: &LogConfig) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle)> {
    let level = config.level()?;
    let format = config.format()?;

    let (filter, filter_handle) = reload::Layer::new(level_filter(level));

    let format_layer: FormatLayer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Console => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(format_layer);

    Ok((
        subscriber,
        LogHandle {
            filter: filter_handle,
            format,
        },
    ))
}

/// Build a subscriber for `config` and install it as the global default
pub fn init(config: &LogConfig) -> Result<LogHandle> {
    let (subscriber, handle) = build(config)?;
    subscriber
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(handle)
}
