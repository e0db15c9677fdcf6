//! Bosun CLI - Install, uninstall and verify templated manifests

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bosun_logging::{LogConfig, LogHandle, WatchExit, watch_config};
use clap::{Args, Parser, Subcommand};
use tracing::{error, warn};

mod commands;
mod error;
mod exit_codes;
mod template;

use commands::TargetArgs;
use error::Result;

#[derive(Parser)]
#[command(name = "bosun")]
#[command(version)]
#[command(about = "Install, uninstall and verify templated manifests against a Kubernetes cluster", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    logging: LoggingArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template and apply it, removing objects it no longer contains
    Install {
        #[command(flatten)]
        target: TargetArgs,

        /// Manifest template (minijinja)
        #[arg(short, long)]
        template: PathBuf,

        /// Set flags on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Abort on the first failed removal of an unused object
        #[arg(long)]
        fail_fast: bool,
    },

    /// Delete every object of an installation
    Uninstall {
        #[command(flatten)]
        target: TargetArgs,

        /// Delete objects of this kind before all others (repeatable)
        #[arg(long = "uninstall-first", value_name = "KIND")]
        uninstall_first: Vec<String>,

        /// Keep retrying until the installation is gone
        #[arg(long)]
        wait: bool,

        /// Seconds between attempts with --wait
        #[arg(long, default_value_t = 5)]
        interval: u64,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Check whether the installed Deployments are ready
    Verify {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Logging options; flags win over the config file, which wins over the environment
#[derive(Debug, Clone, Default, Args)]
struct LoggingArgs {
    /// Log level (debug, info, warn, error) [env: BOSUN_LOGLEVEL]
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (json, console) [env: BOSUN_LOGFORMAT]
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// YAML file with logLevel/logFormat; watched for level changes
    #[arg(long, global = true)]
    log_config: Option<PathBuf>,
}

impl LoggingArgs {
    fn resolve(&self, env: LogConfig) -> Result<LogConfig> {
        let mut config = match &self.log_config {
            Some(path) => LogConfig::load(path)?,
            None => env,
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    ExitCode::from(exit_status(code))
}

/// Codes a process cannot report become a general error
fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_codes::ERROR as u8)
}

async fn run(cli: Cli) -> Result<i32> {
    let config = cli.logging.resolve(LogConfig::from_env("BOSUN"))?;
    let handle = bosun_logging::init(&config)?;

    if let Some(path) = cli.logging.log_config.clone() {
        tokio::spawn(follow_log_config(path, handle));
    }

    match cli.command {
        Commands::Install {
            target,
            template,
            set,
            fail_fast,
        } => commands::install::run(&target, &template, &set, fail_fast).await,

        Commands::Uninstall {
            target,
            uninstall_first,
            wait,
            interval,
            timeout,
        } => {
            commands::uninstall::run(
                &target,
                &uninstall_first,
                wait,
                Duration::from_secs(interval),
                timeout.map(Duration::from_secs),
            )
            .await
        }

        Commands::Verify { target, json } => commands::verify::run(&target, json).await,
    }
}

/// Apply log level changes from `path` for the life of the process
async fn follow_log_config(path: PathBuf, handle: LogHandle) {
    match watch_config(&path, &handle, std::future::pending()).await {
        Ok(WatchExit::RestartRequired { from, to }) => {
            warn!(%from, %to, "log format change takes effect on the next run");
        }
        Ok(WatchExit::Shutdown) => {}
        Err(e) => error!(error = %e, "stopped watching log config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_status_range() {
        assert_eq!(exit_status(exit_codes::USAGE_ERROR), 64);
        assert_eq!(exit_status(-1), 1);
        assert_eq!(exit_status(300), 1);
    }

    #[test]
    fn test_flags_override_env() {
        let args = LoggingArgs {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let env = LogConfig {
            log_level: "error".to_string(),
            log_format: "console".to_string(),
        };

        let config = args.resolve(env).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "console");
    }

    #[test]
    fn test_config_file_overrides_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.yaml");
        std::fs::write(&path, "logLevel: warn\n").unwrap();
        let args = LoggingArgs {
            log_format: Some("text".to_string()),
            log_config: Some(path),
            ..Default::default()
        };

        let config = args.resolve(LogConfig::from_lookup("BOSUN", |_| None)).unwrap();

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, "text");
    }

    #[test]
    fn test_parse_uninstall() {
        let cli = Cli::try_parse_from([
            "bosun",
            "uninstall",
            "--name",
            "shop",
            "--uninstall-first",
            "Deployment",
            "--uninstall-first",
            "StatefulSet",
            "--wait",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.logging.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Uninstall {
                target,
                uninstall_first,
                wait,
                interval,
                ..
            } => {
                assert_eq!(target.name, "shop");
                assert_eq!(target.namespace, "default");
                assert_eq!(uninstall_first, ["Deployment", "StatefulSet"]);
                assert!(wait);
                assert_eq!(interval, 5);
            }
            _ => panic!("expected uninstall"),
        }
    }
}
