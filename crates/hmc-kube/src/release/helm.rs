//! Flux HelmRelease applier

use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::{Client, ResourceExt};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{ApplyResult, ReleaseApplier, ReleaseRequest};
use crate::error::{KubeError, Result};

const HELM_RELEASE_GROUP: &str = "helm.toolkit.fluxcd.io";
const HELM_RELEASE_VERSION: &str = "v2";
const HELM_RELEASE_KIND: &str = "HelmRelease";

/// Applies one Flux `HelmRelease` per component using Server-Side Apply
#[derive(Clone)]
pub struct HelmReleaseApplier {
    client: Client,
    resource: ApiResource,
    field_manager: String,
}

impl HelmReleaseApplier {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        let gvk =
            GroupVersionKind::gvk(HELM_RELEASE_GROUP, HELM_RELEASE_VERSION, HELM_RELEASE_KIND);
        Self {
            client,
            resource: ApiResource::from_gvk(&gvk),
            field_manager: field_manager.into(),
        }
    }

    fn api(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.resource)
    }
}

#[async_trait]
impl ReleaseApplier for HelmReleaseApplier {
    async fn apply(&self, request: &ReleaseRequest) -> Result<ApplyResult> {
        let manifest = helm_release_manifest(request)?;
        let api = self.api(&request.namespace);

        // Read first so an unchanged apply can be told apart from a modifying one
        let before = api
            .get_opt(&request.name)
            .await?
            .and_then(|obj| obj.resource_version());

        let params = PatchParams::apply(&self.field_manager).force();
        let after = api
            .patch(&request.name, &params, &Patch::Apply(&manifest))
            .await
            .map_err(|e| KubeError::Release {
                name: request.name.clone(),
                message: e.to_string(),
            })?;

        let changed = before != after.resource_version();
        debug!(
            release = %request.name,
            namespace = %request.namespace,
            changed,
            "applied HelmRelease"
        );

        Ok(ApplyResult {
            applied: true,
            changed,
        })
    }
}

/// Build the HelmRelease object for a request
///
/// The template name doubles as object name and Helm release name.
pub fn helm_release_manifest(request: &ReleaseRequest) -> Result<Value> {
    let chart_ref = request
        .chart_ref
        .as_ref()
        .ok_or_else(|| KubeError::Release {
            name: request.name.clone(),
            message: "template status does not report a chartRef".to_string(),
        })?;

    let mut spec = json!({
        "chartRef": chart_ref,
        "interval": format_interval(request.interval),
        "releaseName": request.name,
    });
    if let Some(values) = &request.values {
        spec["values"] = values.clone();
    }
    if !request.depends_on.is_empty() {
        spec["dependsOn"] = request
            .depends_on
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
    }

    Ok(json!({
        "apiVersion": format!("{}/{}", HELM_RELEASE_GROUP, HELM_RELEASE_VERSION),
        "kind": HELM_RELEASE_KIND,
        "metadata": {
            "name": request.name,
            "namespace": request.namespace,
            "ownerReferences": [request.owner],
        },
        "spec": spec,
    }))
}

/// Format a duration the way Flux expects (`10m`, `1h30m`, `45s`)
fn format_interval(interval: Duration) -> String {
    let total = interval.as_secs();
    if total == 0 {
        return "0s".to_string();
    }

    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmc_core::ChartRef;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn request() -> ReleaseRequest {
        ReleaseRequest {
            name: "cluster-api".to_string(),
            namespace: "hmc-system".to_string(),
            values: Some(json!({ "replicas": 2 })),
            owner: OwnerReference {
                api_version: "hmc.mirantis.com/v1alpha1".to_string(),
                kind: "Management".to_string(),
                name: "hmc".to_string(),
                uid: "uid-hmc".to_string(),
                block_owner_deletion: Some(true),
                controller: Some(true),
            },
            chart_ref: Some(ChartRef {
                api_version: None,
                kind: "HelmChart".to_string(),
                name: "cluster-api-0-1-0".to_string(),
                namespace: Some("hmc-system".to_string()),
            }),
            interval: Duration::from_secs(600),
            depends_on: vec!["hmc".to_string()],
        }
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(0)), "0s");
        assert_eq!(format_interval(Duration::from_secs(45)), "45s");
        assert_eq!(format_interval(Duration::from_secs(600)), "10m");
        assert_eq!(format_interval(Duration::from_secs(5430)), "1h30m30s");
    }

    #[test]
    fn test_manifest_fields() {
        let manifest = helm_release_manifest(&request()).unwrap();

        assert_eq!(manifest["apiVersion"], "helm.toolkit.fluxcd.io/v2");
        assert_eq!(manifest["kind"], "HelmRelease");
        assert_eq!(manifest["metadata"]["name"], "cluster-api");
        assert_eq!(manifest["metadata"]["ownerReferences"][0]["kind"], "Management");
        assert_eq!(manifest["spec"]["interval"], "10m");
        assert_eq!(manifest["spec"]["releaseName"], "cluster-api");
        assert_eq!(manifest["spec"]["chartRef"]["name"], "cluster-api-0-1-0");
        assert_eq!(manifest["spec"]["values"]["replicas"], 2);
        assert_eq!(manifest["spec"]["dependsOn"], json!([{ "name": "hmc" }]));
    }

    #[test]
    fn test_manifest_without_values_or_dependencies() {
        let mut req = request();
        req.values = None;
        req.depends_on.clear();

        let manifest = helm_release_manifest(&req).unwrap();
        assert!(manifest["spec"].get("values").is_none());
        assert!(manifest["spec"].get("dependsOn").is_none());
    }

    #[test]
    fn test_manifest_requires_chart_ref() {
        let mut req = request();
        req.chart_ref = None;

        let err = helm_release_manifest(&req).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"release 'cluster-api' could not be applied: template status does not report a chartRef"
        );
    }
}
