//! Controller runner watching Management objects

use futures::StreamExt;
use hmc_core::{Management, OperatorConfig};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{KubeError, Result};
use crate::probe::CertManagerProbe;
use crate::reconciler::{ManagementReconciler, PassOutcome};
use crate::release::HelmReleaseApplier;
use crate::store::KubeStore;
use crate::telemetry::Telemetry;

/// Reconciler wired to the API server
pub type KubeReconciler = ManagementReconciler<KubeStore, HelmReleaseApplier, CertManagerProbe>;

/// Delay before retrying a pass that lost a write race
const CONFLICT_REQUEUE: Duration = Duration::from_secs(1);

/// Build a reconciler backed by `client`
pub fn kube_reconciler(
    client: Client,
    config: OperatorConfig,
    telemetry: Telemetry,
) -> KubeReconciler {
    let store = KubeStore::with_client(client.clone(), config.field_manager.clone());
    let applier = HelmReleaseApplier::new(client.clone(), config.field_manager.clone());
    let probe = CertManagerProbe::new(client);
    ManagementReconciler::new(store, applier, probe, config).with_telemetry(telemetry)
}

/// Watch Management objects and reconcile them until a shutdown signal
pub async fn run_controller(
    client: Client,
    config: OperatorConfig,
    telemetry: Telemetry,
) -> Result<()> {
    let api: Api<Management> = Api::all(client.clone());
    let context = Arc::new(kube_reconciler(client, config, telemetry));

    info!("starting Management controller");
    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => debug!(%object, ?action, "reconciled"),
                Err(e) => warn!(error = %e, "controller error"),
            }
        })
        .await;
    info!("Management controller stopped");

    Ok(())
}

async fn reconcile(
    management: Arc<Management>,
    reconciler: Arc<KubeReconciler>,
) -> std::result::Result<Action, KubeError> {
    let namespace = management.namespace().unwrap_or_default();
    let outcome = reconciler
        .reconcile(&namespace, &management.name_any())
        .await?;
    Ok(action_for(&outcome))
}

fn error_policy(
    management: Arc<Management>,
    error: &KubeError,
    reconciler: Arc<KubeReconciler>,
) -> Action {
    warn!(
        namespace = %management.namespace().unwrap_or_default(),
        name = %management.name_any(),
        error = %error,
        "Management reconciliation failed"
    );
    Action::requeue(reconciler.config().retry_interval)
}

/// Requeue decision for a successful pass
///
/// Writes made by the pass trigger a new watch event, so only a lost write
/// race needs an explicit requeue.
pub fn action_for(outcome: &PassOutcome) -> Action {
    match outcome {
        PassOutcome::Conflict => Action::requeue(CONFLICT_REQUEUE),
        PassOutcome::Gone
        | PassOutcome::Registered
        | PassOutcome::Defaulted
        | PassOutcome::Converged(_)
        | PassOutcome::Deleting => Action::await_change(),
    }
}
