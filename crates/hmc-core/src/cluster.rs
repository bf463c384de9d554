//! ManagedCluster: the consumer of cluster templates

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A workload cluster deployed from a `ClusterTemplate`
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "hmc.mirantis.com",
    version = "v1alpha1",
    kind = "ManagedCluster",
    namespaced,
    shortname = "hmc-deploy",
    selectable = ".spec.template",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    /// Name of the cluster template this cluster is built from
    pub template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,

    #[serde(default)]
    pub dry_run: bool,
}

/// Field selector path matching clusters by template name
pub const TEMPLATE_FIELD: &str = "spec.template";

impl ManagedCluster {
    /// Whether this cluster is built from the named template
    pub fn references_template(&self, template: &str) -> bool {
        self.spec.template == template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_template_is_selectable() {
        let crd = ManagedCluster::crd();
        let fields: Vec<_> = crd.spec.versions[0]
            .selectable_fields
            .iter()
            .flatten()
            .map(|f| f.json_path.clone())
            .collect();
        assert_eq!(fields, vec![format!(".{}", TEMPLATE_FIELD)]);
    }

    #[test]
    fn test_references_template() {
        let cluster = ManagedCluster::new(
            "dev",
            ManagedClusterSpec {
                template: "aws-standalone".to_string(),
                ..Default::default()
            },
        );
        assert!(cluster.references_template("aws-standalone"));
        assert!(!cluster.references_template("aws"));
    }
}
