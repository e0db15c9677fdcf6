//! Verify command - report whether the installed Deployments are ready

use bosun_kube::{KubeError, VerificationResult};
use console::style;

use super::{TargetArgs, connect};
use crate::error::Result;
use crate::exit_codes;

/// Run the verify command
pub async fn run(target: &TargetArgs, json: bool) -> Result<i32> {
    let installer = connect(target).await?.build()?;
    let result = installer.verify().await?;

    if json {
        let output = serde_json::to_string_pretty(&result).map_err(KubeError::from)?;
        println!("{output}");
    } else {
        print_result(&target.name, &result);
    }

    Ok(exit_code(&result))
}

fn print_result(name: &str, result: &VerificationResult) {
    if result.ready {
        println!(
            "{} {} is ready",
            style("✓").green().bold(),
            style(name).cyan()
        );
    } else if result.reason.is_empty() {
        println!(
            "{} {} has not been installed",
            style("…").yellow(),
            style(name).cyan()
        );
    } else {
        println!(
            "{} {} is not ready: {}",
            style("…").yellow(),
            style(name).cyan(),
            style(&result.reason).yellow()
        );
    }
}

fn exit_code(result: &VerificationResult) -> i32 {
    if result.ready {
        exit_codes::SUCCESS
    } else {
        exit_codes::NOT_READY
    }
}
