//! Can-delete command - ask the deletion guard about a template

use console::style;
use hmc_core::{OperatorConfig, TemplateKind};
use hmc_kube::{DeletionGuard, KubeStore, Verdict};

use crate::error::{CliError, Result};

/// Check whether the template could be deleted right now
pub async fn run(config: &OperatorConfig, kind: TemplateKind, name: &str) -> Result<()> {
    let store = KubeStore::new(config.field_manager.clone()).await?;
    let guard = DeletionGuard::new(store);

    let verdict = guard.check_no_consumers(kind, name).await?;
    for warning in verdict.warnings() {
        println!("{} {}", style("warning:").yellow().bold(), warning);
    }

    match verdict {
        Verdict::Allowed { .. } => {
            println!(
                "{} {} {} can be deleted",
                style("✓").green().bold(),
                kind,
                style(name).cyan()
            );
            Ok(())
        }
        Verdict::Denied { reason, .. } => Err(CliError::denied(reason)),
    }
}
