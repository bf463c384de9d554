//! Aggregation of per-component outcomes into a Management status

use hmc_core::{ComponentStatus, ManagementStatus, Providers};
use std::collections::BTreeMap;

use crate::error::ComponentErrors;

/// Collects the outcome of every component of one pass
///
/// Built fresh for each pass: outcomes and the provider inventory never carry
/// over from a previous status.
#[derive(Debug, Default)]
pub struct StatusAggregator {
    components: BTreeMap<String, ComponentStatus>,
    providers: Providers,
    errors: ComponentErrors,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful component and add its providers to the inventory
    pub fn record_success(&mut self, template: &str, providers: &Providers) {
        self.components
            .insert(template.to_string(), ComponentStatus::succeeded());
        self.providers.extend_from(providers);
    }

    /// Record a failed component; it contributes nothing to the inventory
    pub fn record_failure(&mut self, template: &str, error: impl Into<String>) {
        let error = error.into();
        self.errors.push(error.clone());
        self.components
            .insert(template.to_string(), ComponentStatus::failed(error));
    }

    /// Number of failures recorded so far
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn succeeded(&self) -> usize {
        self.components.values().filter(|c| c.success).count()
    }

    /// Final status for `generation`, plus the joined error if anything failed
    pub fn into_status(self, generation: i64) -> (ManagementStatus, Option<ComponentErrors>) {
        let status = ManagementStatus {
            observed_generation: generation,
            available_providers: self.providers,
            components: self.components,
        };
        (status, self.errors.into_result())
    }
}
