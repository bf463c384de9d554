//! Dependency resolution for Management components
//!
//! The hierarchy is fixed: the orchestration layer depends on the core
//! service, and every provider depends on the orchestration layer. Providers
//! never depend on each other.

use hmc_core::{Component, ManagementSpec};
use serde_json::Value;

/// Where a component sits in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRole {
    CoreService,
    Orchestration,
    /// Infrastructure provider, with its key in `spec.providers`
    Provider(String),
}

/// A component ready to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    pub template: String,
    pub config: Option<Value>,
    /// Templates that must be installed first
    pub depends_on: Vec<String>,
    pub role: ComponentRole,
}

impl ResolvedComponent {
    fn new(component: &Component, role: ComponentRole, depends_on: Vec<String>) -> Self {
        Self {
            template: component.template.clone(),
            config: component.config.clone(),
            depends_on,
            role,
        }
    }

    pub fn is_core_service(&self) -> bool {
        self.role == ComponentRole::CoreService
    }
}

/// Order components as core service, orchestration, then providers by name
///
/// Returns an empty list when the spec has no core section.
pub fn resolve_components(spec: &ManagementSpec) -> Vec<ResolvedComponent> {
    let Some(core) = &spec.core else {
        return Vec::new();
    };

    let mut resolved = Vec::with_capacity(2 + spec.providers.len());
    resolved.push(ResolvedComponent::new(
        &core.hmc,
        ComponentRole::CoreService,
        Vec::new(),
    ));
    resolved.push(ResolvedComponent::new(
        &core.capi,
        ComponentRole::Orchestration,
        vec![core.hmc.template.clone()],
    ));

    // BTreeMap iteration is name-ordered
    for (name, provider) in &spec.providers {
        resolved.push(ResolvedComponent::new(
            provider,
            ComponentRole::Provider(name.clone()),
            vec![core.capi.template.clone()],
        ));
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmc_core::Core;
    use serde_json::json;

    fn spec(providers: &[(&str, &str)]) -> ManagementSpec {
        ManagementSpec {
            core: Some(Core::with_templates("A", "B")),
            providers: providers
                .iter()
                .map(|(name, template)| (name.to_string(), Component::new(*template)))
                .collect(),
        }
    }

    #[test]
    fn test_resolve_order_and_edges() {
        let resolved = resolve_components(&spec(&[("p1", "C")]));

        let order: Vec<_> = resolved.iter().map(|c| c.template.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);

        assert!(resolved[0].depends_on.is_empty());
        assert!(resolved[0].is_core_service());
        assert_eq!(resolved[1].depends_on, vec!["A"]);
        assert_eq!(resolved[1].role, ComponentRole::Orchestration);
        assert_eq!(resolved[2].depends_on, vec!["B"]);
        assert_eq!(resolved[2].role, ComponentRole::Provider("p1".to_string()));
    }

    #[test]
    fn test_providers_sorted_by_name() {
        let resolved = resolve_components(&spec(&[
            ("vsphere", "vsphere-tpl"),
            ("aws", "aws-tpl"),
            ("azure", "azure-tpl"),
        ]));

        let order: Vec<_> = resolved.iter().skip(2).map(|c| c.template.as_str()).collect();
        assert_eq!(order, vec!["aws-tpl", "azure-tpl", "vsphere-tpl"]);
        // No provider-on-provider edges
        assert!(resolved.iter().skip(2).all(|c| c.depends_on == vec!["B"]));
    }

    #[test]
    fn test_config_is_carried() {
        let mut spec = spec(&[]);
        if let Some(core) = spec.core.as_mut() {
            core.capi.config = Some(json!({ "replicas": 3 }));
        }

        let resolved = resolve_components(&spec);
        assert_eq!(resolved[1].config, Some(json!({ "replicas": 3 })));
        assert_eq!(resolved[0].config, None);
    }

    #[test]
    fn test_no_core_resolves_nothing() {
        let spec = ManagementSpec {
            core: None,
            providers: [("aws".to_string(), Component::new("aws-tpl"))].into(),
        };
        assert!(resolve_components(&spec).is_empty());
    }
}
