//! Template resources and template kinds

use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::management::Providers;

/// A reusable component descriptor backed by a Helm chart
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "hmc.mirantis.com",
    version = "v1alpha1",
    kind = "Template",
    namespaced,
    status = "TemplateStatus",
    shortname = "tmpl",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default)]
    pub helm: HelmSpec,
}

/// Where the chart of a template comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_ref: Option<ChartRef>,
}

/// Validation result published by the template controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStatus {
    #[serde(default)]
    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,

    /// Chart source the release controller should install from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_ref: Option<ChartRef>,

    /// Capabilities the template provides once deployed
    #[serde(default)]
    pub providers: Providers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Cross-namespace reference to a chart source (Flux `HelmChart`, `OCIRepository`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub kind: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// The kinds of template the admission layer protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Blueprint for a `ManagedCluster`
    #[serde(rename = "ClusterTemplate")]
    Cluster,

    /// Service installed on top of managed clusters
    #[serde(rename = "ServiceTemplate")]
    Service,

    /// Provider installed in the management cluster
    #[serde(rename = "ProviderTemplate")]
    Provider,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [Self::Cluster, Self::Service, Self::Provider];

    /// Parse the Kubernetes kind name (`ClusterTemplate`, ...)
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.kind() == kind)
    }

    /// Kubernetes kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cluster => "ClusterTemplate",
            Self::Service => "ServiceTemplate",
            Self::Provider => "ProviderTemplate",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cluster" | "clustertemplate" => Ok(Self::Cluster),
            "service" | "servicetemplate" => Ok(Self::Service),
            "provider" | "providertemplate" => Ok(Self::Provider),
            other => Err(format!(
                "unknown template kind '{}' (expected cluster, service or provider)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_round_trip() {
        for kind in TemplateKind::ALL {
            assert_eq!(TemplateKind::from_kind(kind.kind()), Some(kind));
        }
        assert_eq!(TemplateKind::from_kind("Template"), None);
    }

    #[test]
    fn test_kind_from_cli_spelling() {
        assert_eq!("cluster".parse::<TemplateKind>(), Ok(TemplateKind::Cluster));
        assert_eq!(
            "ProviderTemplate".parse::<TemplateKind>(),
            Ok(TemplateKind::Provider)
        );
        assert!("machine".parse::<TemplateKind>().is_err());
    }

    #[test]
    fn test_status_defaults_to_invalid() {
        let status: TemplateStatus = serde_json::from_value(json!({})).unwrap();
        assert!(!status.valid);
        assert!(status.chart_ref.is_none());
        assert!(status.providers.is_empty());
    }

    #[test]
    fn test_status_wire_format() {
        let status: TemplateStatus = serde_json::from_value(json!({
            "valid": true,
            "chartRef": {"kind": "HelmChart", "name": "hmc-0-1-0", "namespace": "hmc-system"},
            "providers": {"infrastructure": ["aws"]}
        }))
        .unwrap();

        assert!(status.valid);
        assert_eq!(status.chart_ref.unwrap().name, "hmc-0-1-0");
        assert_eq!(status.providers.infrastructure, vec!["aws"]);
    }
}
