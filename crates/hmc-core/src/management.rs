//! The Management resource: desired platform components and their observed state

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::MANAGEMENT_FINALIZER;

/// Desired state of the management cluster
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "hmc.mirantis.com",
    version = "v1alpha1",
    kind = "Management",
    namespaced,
    status = "ManagementStatus",
    shortname = "hmc-mgmt",
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagementSpec {
    /// Core components; defaulted by the controller when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Core>,

    /// Infrastructure providers keyed by provider name
    ///
    /// A sorted map so providers are always applied in name order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, Component>,
}

/// The two mandatory core components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Core {
    /// The HMC core service
    pub hmc: Component,

    /// The cluster-api orchestration layer
    pub capi: Component,
}

impl Core {
    /// Core configuration referencing the given templates with empty configs
    pub fn with_templates(hmc: impl Into<String>, capi: impl Into<String>) -> Self {
        Self {
            hmc: Component::new(hmc),
            capi: Component::new(capi),
        }
    }
}

/// A component: a template reference plus its raw configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Name of the Template to deploy
    pub template: String,

    /// Values passed verbatim to the release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl Component {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            config: None,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// Observed state written after every convergence pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementStatus {
    /// Generation that produced this status
    #[serde(default)]
    pub observed_generation: i64,

    /// Providers contributed by successfully reconciled components
    #[serde(default)]
    pub available_providers: Providers,

    /// Outcome per component, keyed by template name
    #[serde(default)]
    pub components: BTreeMap<String, ComponentStatus>,
}

/// Capability lists reported by templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Providers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infrastructure: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bootstrap: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_plane: Vec<String>,
}

impl Providers {
    /// Append every list of `other` to the matching list of `self`
    pub fn extend_from(&mut self, other: &Providers) {
        self.infrastructure
            .extend(other.infrastructure.iter().cloned());
        self.bootstrap.extend(other.bootstrap.iter().cloned());
        self.control_plane
            .extend(other.control_plane.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.infrastructure.is_empty() && self.bootstrap.is_empty() && self.control_plane.is_empty()
    }

    pub fn len(&self) -> usize {
        self.infrastructure.len() + self.bootstrap.len() + self.control_plane.len()
    }
}

/// Outcome of a single component in the last pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub success: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ComponentStatus {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl Management {
    /// Generation of the spec, zero when the API server did not set one
    pub fn generation(&self) -> i64 {
        self.metadata.generation.unwrap_or_default()
    }

    /// Whether the API server has started deleting this object
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    pub fn has_finalizer(&self) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|name| name == MANAGEMENT_FINALIZER))
    }

    /// Attach the management finalizer, returning `true` if it was missing
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(MANAGEMENT_FINALIZER.to_string());
        true
    }

    /// Fill in the core components when none were provided
    ///
    /// Returns `true` if the spec changed. An existing core is never touched.
    pub fn apply_default_core(&mut self, hmc_template: &str, capi_template: &str) -> bool {
        if self.spec.core.is_some() {
            return false;
        }
        self.spec.core = Some(Core::with_templates(hmc_template, capi_template));
        true
    }

    /// Namespace of the object, empty for objects not yet persisted
    pub fn namespace_or_default(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_finalizer_is_idempotent() {
        let mut mgmt = Management::new("hmc", ManagementSpec::default());
        assert!(!mgmt.has_finalizer());

        assert!(mgmt.add_finalizer());
        assert!(!mgmt.add_finalizer());
        assert_eq!(
            mgmt.metadata.finalizers,
            Some(vec![MANAGEMENT_FINALIZER.to_string()])
        );
    }

    #[test]
    fn test_add_finalizer_keeps_foreign_finalizers() {
        let mut mgmt = Management::new("hmc", ManagementSpec::default());
        mgmt.metadata.finalizers = Some(vec!["example.com/other".to_string()]);

        assert!(mgmt.add_finalizer());
        assert_eq!(mgmt.metadata.finalizers.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_default_core_only_when_absent() {
        let mut mgmt = Management::new("hmc", ManagementSpec::default());
        assert!(mgmt.apply_default_core("hmc", "cluster-api"));

        let core = mgmt.spec.core.clone().unwrap();
        assert_eq!(core.hmc.template, "hmc");
        assert_eq!(core.capi.template, "cluster-api");

        assert!(!mgmt.apply_default_core("other", "other"));
        assert_eq!(mgmt.spec.core, Some(core));
    }

    #[test]
    fn test_spec_wire_format() {
        let spec: ManagementSpec = serde_json::from_value(json!({
            "core": {
                "hmc": {"template": "hmc", "config": {"replicas": 2}},
                "capi": {"template": "cluster-api"}
            },
            "providers": {
                "aws": {"template": "cluster-api-provider-aws"},
                "azure": {"template": "cluster-api-provider-azure"}
            }
        }))
        .unwrap();

        let core = spec.core.unwrap();
        assert_eq!(core.hmc.config, Some(json!({"replicas": 2})));
        assert_eq!(core.capi.config, None);
        assert_eq!(
            spec.providers.keys().collect::<Vec<_>>(),
            vec!["aws", "azure"]
        );
    }

    #[test]
    fn test_status_wire_format() {
        let mut status = ManagementStatus {
            observed_generation: 3,
            ..Default::default()
        };
        status.available_providers.control_plane.push("k0smotron".to_string());
        status
            .components
            .insert("hmc".to_string(), ComponentStatus::succeeded());
        status
            .components
            .insert("aws".to_string(), ComponentStatus::failed("boom"));

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({
                "observedGeneration": 3,
                "availableProviders": {"controlPlane": ["k0smotron"]},
                "components": {
                    "aws": {"success": false, "error": "boom"},
                    "hmc": {"success": true}
                }
            })
        );
    }

    #[test]
    fn test_providers_extend() {
        let mut inventory = Providers::default();
        assert!(inventory.is_empty());

        let reported = Providers {
            infrastructure: vec!["aws".to_string()],
            bootstrap: vec!["k0s".to_string()],
            control_plane: vec!["k0s".to_string(), "k0smotron".to_string()],
        };
        inventory.extend_from(&reported);
        inventory.extend_from(&reported);

        assert_eq!(inventory.infrastructure, vec!["aws", "aws"]);
        assert_eq!(inventory.len(), 8);
    }
}
