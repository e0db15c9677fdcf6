//! Uninstall command - remove an installation from Kubernetes

use std::time::Duration;

use bosun_core::Predicate;
use bosun_core::predicate::has_kind;
use bosun_kube::{Installer, UninstallOptions};
use console::style;
use tracing::debug;

use super::{TargetArgs, connect};
use crate::error::{CliError, Result};
use crate::exit_codes;

/// Predicate matching any of `kinds`; `None` when no kind was given
pub fn uninstall_first(kinds: &[String]) -> Option<Predicate> {
    if kinds.is_empty() {
        return None;
    }
    Some(Predicate::any_of(kinds.iter().map(has_kind)))
}

/// Run the uninstall command
pub async fn run(
    target: &TargetArgs,
    first_kinds: &[String],
    wait: bool,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<i32> {
    if interval.is_zero() {
        return Err(CliError::usage("--interval must be greater than zero"));
    }

    println!(
        "{} Uninstalling {} from namespace {}",
        style("→").blue().bold(),
        style(&target.name).cyan(),
        style(&target.namespace).yellow()
    );

    let installer = connect(target).await?.build()?;
    let mut options = UninstallOptions::new();
    if let Some(predicate) = uninstall_first(first_kinds) {
        options = options.with_uninstall_first(predicate);
    }

    if !wait {
        return Ok(report(&target.name, installer.uninstall(&options).await?));
    }

    let converge = until_done(&installer, &options, interval);
    let done = tokio::select! {
        result = converge => result?,
        _ = tokio::signal::ctrl_c() => return Err(CliError::Interrupted),
        _ = sleep_or_forever(timeout) => false,
    };

    Ok(report(&target.name, done))
}

async fn until_done(
    installer: &Installer,
    options: &UninstallOptions,
    interval: Duration,
) -> Result<bool> {
    let mut attempt = 1u32;
    while !installer.uninstall(options).await? {
        debug!(attempt, "uninstall not finished, retrying");
        tokio::time::sleep(interval).await;
        attempt += 1;
    }
    Ok(true)
}

async fn sleep_or_forever(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

fn report(name: &str, done: bool) -> i32 {
    if done {
        println!(
            "{} Successfully uninstalled {}",
            style("✓").green().bold(),
            style(name).cyan()
        );
        exit_codes::SUCCESS
    } else {
        println!(
            "{} Uninstall of {} is still in progress; run again to continue",
            style("…").yellow(),
            style(name).cyan()
        );
        exit_codes::NOT_READY
    }
}
