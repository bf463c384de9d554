//! Release application
//!
//! Each component ends up as one declarative release object owned by the
//! Management. Appliers must be idempotent: applying the same request twice
//! leaves the cluster unchanged and reports `changed == false`.
//!
//! Dependencies are passed through as hints; waiting for a dependency to
//! become healthy is the release controller's job, not the applier's.

mod helm;
mod mock;

pub use helm::{HelmReleaseApplier, helm_release_manifest};
pub use mock::MockReleaseApplier;

use async_trait::async_trait;
use hmc_core::ChartRef;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use std::time::Duration;

use crate::error::Result;

/// Everything needed to converge one component release
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRequest {
    /// Release name, the template name of the component
    pub name: String,

    /// Namespace the release object is created in
    pub namespace: String,

    /// Values handed to the chart
    pub values: Option<serde_json::Value>,

    /// Owner link so the release is garbage-collected with the Management
    pub owner: OwnerReference,

    /// Chart source reported by the template
    pub chart_ref: Option<ChartRef>,

    /// How often the release controller re-reconciles the release
    pub interval: Duration,

    /// Names of releases this one should be installed after
    pub depends_on: Vec<String>,
}

/// Result of applying a single release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyResult {
    /// The release object exists in its desired form
    pub applied: bool,
    /// The apply modified the stored object
    pub changed: bool,
}

/// Applier trait for component releases
#[async_trait]
pub trait ReleaseApplier: Send + Sync {
    /// Create or update the release described by `request`
    async fn apply(&self, request: &ReleaseRequest) -> Result<ApplyResult>;
}
