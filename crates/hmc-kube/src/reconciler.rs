//! Management convergence pass
//!
//! A pass infers what to do from the current object:
//! - deletion timestamp set: nothing yet (see [`PassOutcome::Deleting`])
//! - finalizer missing: attach it, persist, stop
//! - no core components: write the defaults, persist, stop
//! - otherwise: probe cert-manager, apply every component, persist status
//!
//! Each write persists on its own pass so that the next pass always starts
//! from a fresh read.

use hmc_core::{CoreValues, Management, ManagementStatus, OperatorConfig, Template};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use serde_json::{Map, json};
use tracing::{debug, info, warn};

use crate::error::{KubeError, Result};
use crate::probe::CapabilityProbe;
use crate::release::{ReleaseApplier, ReleaseRequest};
use crate::resolver::{ResolvedComponent, resolve_components};
use crate::status::StatusAggregator;
use crate::store::ClusterStore;
use crate::telemetry::{MANAGEMENT_RECONCILE_EVENT, Telemetry};

/// What a single pass did
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The Management no longer exists
    Gone,
    /// The finalizer was attached
    Registered,
    /// Default core components were written
    Defaulted,
    /// Every component was applied successfully and status persisted
    Converged(PassSummary),
    /// Deletion in progress; no cleanup is performed
    Deleting,
    /// A write lost against a concurrent update; retry from a fresh read
    Conflict,
}

/// Summary of a converged pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    /// Components applied
    pub applied: usize,
    /// Components whose release object was modified
    pub changed: usize,
    /// Status as persisted
    pub status: ManagementStatus,
}

/// Converges Management objects
pub struct ManagementReconciler<S, A, P> {
    store: S,
    applier: A,
    probe: P,
    telemetry: Telemetry,
    config: OperatorConfig,
}

impl<S, A, P> ManagementReconciler<S, A, P>
where
    S: ClusterStore,
    A: ReleaseApplier,
    P: CapabilityProbe,
{
    pub fn new(store: S, applier: A, probe: P, config: OperatorConfig) -> Self {
        Self {
            store,
            applier,
            probe,
            telemetry: Telemetry::disabled(),
            config,
        }
    }

    /// Attach a telemetry sink
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass for the Management `namespace/name`
    ///
    /// Component failures are recorded in the status and returned joined as
    /// [`KubeError::Components`] after the status write; a failed write other
    /// than a conflict joins them.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<PassOutcome> {
        info!(management = %format!("{}/{}", namespace, name), "reconciling Management");

        let Some(management) = self.store.get_management(namespace, name).await? else {
            info!(namespace, name, "Management not found, ignoring since object must be deleted");
            return Ok(PassOutcome::Gone);
        };

        let outcome = if management.is_deleting() {
            info!(namespace, name, "deleting Management");
            Ok(PassOutcome::Deleting)
        } else {
            self.update(management).await
        };

        match outcome {
            Err(e) if e.is_conflict() => {
                debug!(namespace, name, error = %e, "Management changed during the pass, requeueing");
                Ok(PassOutcome::Conflict)
            }
            other => other,
        }
    }

    async fn update(&self, mut management: Management) -> Result<PassOutcome> {
        if management.add_finalizer() {
            self.store.update_management(&management).await?;
            return Ok(PassOutcome::Registered);
        }

        if management.apply_default_core(
            &self.config.default_core_template,
            &self.config.default_orchestration_template,
        ) {
            info!(
                namespace = management.namespace_or_default(),
                name = management.name(),
                "applying default core configuration"
            );
            self.store.update_management(&management).await?;
            return Ok(PassOutcome::Defaulted);
        }

        self.converge(management).await
    }

    async fn converge(&self, mut management: Management) -> Result<PassOutcome> {
        let namespace = management.namespace_or_default().to_string();
        let owner = owner_reference(&management)?;

        let mut components = resolve_components(&management.spec);
        if let Some(core) = components.iter_mut().find(|c| c.is_core_service()) {
            let values = CoreValues::from_config(core.config.as_ref())?;
            self.probe.verify(&self.config.system_namespace).await?;
            info!("cert manager is installed, enabling the HMC admission webhook");
            core.config = Some(values.enable_admission_webhook().to_config()?);
        }

        let mut aggregator = StatusAggregator::new();
        let mut changed = 0;
        for component in &components {
            let template = match self.valid_template(&component.template).await {
                Ok(template) => template,
                Err(message) => {
                    aggregator.record_failure(&component.template, message);
                    continue;
                }
            };

            let request = self.release_request(component, &namespace, &owner, &template);
            match self.applier.apply(&request).await {
                Ok(result) => {
                    if result.changed {
                        changed += 1;
                    }
                    let providers = template.status.unwrap_or_default().providers;
                    aggregator.record_success(&component.template, &providers);
                }
                Err(e) => aggregator.record_failure(
                    &component.template,
                    format!(
                        "error reconciling HelmRelease {}/{}: {}",
                        namespace, component.template, e
                    ),
                ),
            }
        }

        let applied = aggregator.succeeded();
        let failed = aggregator.failed();
        let (status, errors) = aggregator.into_status(management.generation());
        let mut errors = errors.unwrap_or_default();
        management.status = Some(status.clone());
        match self.store.update_management_status(&management).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => return Err(e),
            Err(e) => errors.push(format!(
                "failed to update status for Management {}/{}: {}",
                namespace,
                management.name(),
                e
            )),
        }

        self.emit_telemetry(&management, applied, failed).await;

        if let Some(errors) = errors.into_result() {
            warn!(
                namespace = %namespace,
                name = management.name(),
                failed = errors.len(),
                "errors during Management reconciliation"
            );
            return Err(errors.into());
        }

        Ok(PassOutcome::Converged(PassSummary {
            applied,
            changed,
            status,
        }))
    }

    /// Fetch a component template, returning the component error message on failure
    async fn valid_template(&self, name: &str) -> std::result::Result<Template, String> {
        let namespace = &self.config.templates_namespace;
        let template = match self.store.get_template(namespace, name).await {
            Ok(template) => template,
            Err(e) if e.is_not_found() => {
                return Err(format!("failed to get Template {}/{}: not found", namespace, name));
            }
            Err(e) => return Err(format!("failed to get Template {}/{}: {}", namespace, name, e)),
        };

        if !template.status.as_ref().is_some_and(|s| s.valid) {
            return Err(format!("Template {}/{} is not marked as valid", namespace, name));
        }
        Ok(template)
    }

    fn release_request(
        &self,
        component: &ResolvedComponent,
        namespace: &str,
        owner: &OwnerReference,
        template: &Template,
    ) -> ReleaseRequest {
        ReleaseRequest {
            name: component.template.clone(),
            namespace: namespace.to_string(),
            values: component.config.clone(),
            owner: owner.clone(),
            chart_ref: template.status.as_ref().and_then(|s| s.chart_ref.clone()),
            interval: self.config.release_interval,
            depends_on: component.depends_on.clone(),
        }
    }

    async fn emit_telemetry(&self, management: &Management, applied: usize, failed: usize) {
        if !self.telemetry.is_enabled() {
            return;
        }

        let mut properties = Map::new();
        properties.insert("applied".to_string(), json!(applied));
        properties.insert("failed".to_string(), json!(failed));
        properties.insert("providers".to_string(), json!(management.spec.providers.len()));

        let id = management.metadata.uid.as_deref().unwrap_or_default();
        if let Err(e) = self
            .telemetry
            .track(MANAGEMENT_RECONCILE_EVENT, id, properties)
            .await
        {
            warn!(error = %e, "failed to send telemetry event");
        }
    }
}

/// Owner link tying every release to the Management for garbage collection
fn owner_reference(management: &Management) -> Result<OwnerReference> {
    management
        .controller_owner_ref(&())
        .ok_or_else(|| KubeError::InvalidConfig("Management has no metadata.uid".to_string()))
}
