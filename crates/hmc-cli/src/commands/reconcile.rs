//! Reconcile command - run a single convergence pass

use console::style;
use hmc_core::OperatorConfig;
use hmc_kube::{Telemetry, kube_reconciler};
use kube::Client;

use crate::display;
use crate::error::Result;

/// Run one pass for `namespace/name` and print what it did
pub async fn run(config: OperatorConfig, namespace: Option<&str>, name: &str) -> Result<()> {
    let namespace = namespace.unwrap_or(&config.system_namespace).to_string();
    let client = Client::try_default().await?;
    let reconciler = kube_reconciler(client, config, Telemetry::disabled());

    println!(
        "Reconciling Management {}...",
        style(format!("{}/{}", namespace, name)).cyan()
    );
    let outcome = reconciler.reconcile(&namespace, name).await?;
    display::print_outcome(&outcome);
    Ok(())
}
