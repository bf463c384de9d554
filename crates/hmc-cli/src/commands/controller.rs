//! Controller command - run the Management controller

use hmc_core::OperatorConfig;
use hmc_kube::{Telemetry, run_controller};
use kube::Client;
use tracing::info;

use crate::error::Result;

/// Run the controller until interrupted
pub async fn run(config: OperatorConfig) -> Result<()> {
    let telemetry = Telemetry::from_config(&config.telemetry)?;
    info!(
        system_namespace = %config.system_namespace,
        templates_namespace = %config.templates_namespace,
        telemetry = telemetry.is_enabled(),
        "starting HMC controller"
    );

    let client = Client::try_default().await?;
    run_controller(client, config, telemetry).await?;
    Ok(())
}
