//! Install command - render a template and reconcile it into the cluster

use std::path::Path;

use bosun_core::{Flags, FlagsBuilder};
use bosun_kube::{CleanupPolicy, InstallOptions};
use console::style;

use super::{TargetArgs, connect};
use crate::error::{CliError, Result};
use crate::exit_codes;
use crate::template::TemplateRenderer;

/// Build nested flags from `--set key=value` arguments
pub fn parse_set_flags(set_values: &[String]) -> Result<Flags> {
    let mut builder = FlagsBuilder::new();
    for arg in set_values {
        if !arg.contains('=') {
            return Err(CliError::usage_with_help(
                format!("Invalid --set format: '{arg}'"),
                "Expected key=value, e.g. --set image.tag=1.2.3",
            ));
        }
        builder = builder.with_set(arg)?;
    }
    Ok(builder.build()?)
}

/// Run the install command
pub async fn run(
    target: &TargetArgs,
    template: &Path,
    set_values: &[String],
    fail_fast: bool,
) -> Result<i32> {
    let flags = parse_set_flags(set_values)?;
    let renderer = TemplateRenderer::from_file(template, target.key())?;

    println!(
        "{} Installing {} into namespace {}",
        style("→").blue().bold(),
        style(&target.name).cyan(),
        style(&target.namespace).yellow()
    );

    let installer = connect(target).await?.renderer(renderer).build()?;

    let cleanup = if fail_fast {
        CleanupPolicy::FailFast
    } else {
        CleanupPolicy::BestEffort
    };
    let options = InstallOptions::new().with_flags(flags).with_cleanup(cleanup);

    let summary = installer.install(&options).await?;

    for (key, error) in &summary.removal_failed {
        println!(
            "{} Could not remove {}: {}",
            style("⚠").yellow(),
            style(key).cyan(),
            error
        );
    }
    for key in &summary.removal_pending {
        println!("  {} still terminating", style(key).dim());
    }

    println!(
        "{} Installed {} ({})",
        style("✓").green().bold(),
        style(&target.name).cyan(),
        summary.summary()
    );

    Ok(exit_codes::SUCCESS)
}
