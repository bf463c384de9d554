//! Cluster stores for the objects the controller reads and writes
//!
//! Two backends are provided:
//! - **Kube** (default): talks to the API server
//! - **Mock**: in-memory, for tests without a cluster
//!
//! Every write carries the resourceVersion it was read at. A write against a
//! stale version fails with [`KubeError::Conflict`] and never overwrites.

mod apiserver;
mod mock;

pub use apiserver::KubeStore;
pub use mock::{MockClusterStore, OperationCounts};

use async_trait::async_trait;
use hmc_core::{ManagedCluster, Management, Template};
use kube::ResourceExt;

use crate::error::{KubeError, Result};

/// Store trait for the objects touched by reconciliation and admission
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Get a Management, `None` if it does not exist
    async fn get_management(&self, namespace: &str, name: &str) -> Result<Option<Management>>;

    /// Persist metadata and spec of a Management
    async fn update_management(&self, management: &Management) -> Result<Management>;

    /// Persist the status of a Management
    async fn update_management_status(&self, management: &Management) -> Result<Management>;

    /// Get a Template by name
    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template>;

    /// Find one ManagedCluster built from the given template, if any
    ///
    /// This is an existence check: implementations stop at the first match.
    async fn find_template_consumer(&self, template: &str) -> Result<Option<ConsumerRef>>;
}

/// A resource that still references a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerRef {
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl From<&ManagedCluster> for ConsumerRef {
    fn from(cluster: &ManagedCluster) -> Self {
        Self {
            kind: "ManagedCluster".to_string(),
            namespace: cluster.namespace(),
            name: cluster.name_any(),
        }
    }
}

impl std::fmt::Display for ConsumerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Error for a write attempted on an object that was never read from the server
fn missing_metadata(kind: &str, field: &str) -> KubeError {
    KubeError::InvalidConfig(format!("{} has no metadata.{}", kind, field))
}
