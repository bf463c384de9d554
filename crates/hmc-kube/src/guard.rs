//! Deletion guard for templates
//!
//! Whether a template may be deleted is decided by a per-kind policy table.
//! Cluster templates are protected while any ManagedCluster references them;
//! service and provider templates go through the same check but are not
//! protected.

use hmc_core::TemplateKind;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::ClusterStore;

/// Error reported when deletion is refused
pub const DELETION_FORBIDDEN: &str = "template deletion is forbidden";

/// What must hold before a template of a given kind can be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// No consumer may reference the template
    RequireNoConsumers,
    /// Deletion is always allowed
    Unchecked,
}

impl DeletePolicy {
    /// Policy table
    pub fn for_kind(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Cluster => DeletePolicy::RequireNoConsumers,
            TemplateKind::Service | TemplateKind::Provider => DeletePolicy::Unchecked,
        }
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed { warnings: Vec<String> },
    Denied { warnings: Vec<String>, reason: String },
}

impl Verdict {
    pub fn allowed() -> Self {
        Verdict::Allowed {
            warnings: Vec::new(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed { .. })
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Verdict::Allowed { warnings } | Verdict::Denied { warnings, .. } => warnings,
        }
    }
}

/// Checks template deletions against the consumers in the cluster
pub struct DeletionGuard<S> {
    store: S,
}

impl<S: ClusterStore> DeletionGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Decide whether the template `name` of `kind` may be deleted
    ///
    /// A failed consumer lookup is returned as an error; callers deny on it.
    pub async fn check_no_consumers(&self, kind: TemplateKind, name: &str) -> Result<Verdict> {
        match DeletePolicy::for_kind(kind) {
            DeletePolicy::Unchecked => {
                debug!(%kind, name, "deletion unchecked for this template kind");
                Ok(Verdict::allowed())
            }
            DeletePolicy::RequireNoConsumers => {
                let Some(consumer) = self.store.find_template_consumer(name).await? else {
                    return Ok(Verdict::allowed());
                };

                info!(%kind, name, %consumer, "refusing template deletion");
                Ok(Verdict::Denied {
                    warnings: vec![format!(
                        "The {} {} can't be removed while {} still references it",
                        kind, name, consumer
                    )],
                    reason: DELETION_FORBIDDEN.to_string(),
                })
            }
        }
    }
}
