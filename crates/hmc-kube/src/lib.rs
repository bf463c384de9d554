//! HMC Kube - Kubernetes integration for the HMC management operator
//!
//! This crate provides:
//! - **Cluster Store**: Read and write Management, Template and ManagedCluster objects
//! - **Dependency Resolver**: Turn a Management spec into ordered component operations
//! - **Release Applier**: Idempotently apply Flux HelmReleases for each component
//! - **Status Aggregation**: Per-component outcomes and the available provider inventory
//! - **Reconciler**: One convergence pass over a Management object
//! - **Deletion Guard**: Block template removal while clusters still reference it
//! - **Admission**: Translate AdmissionReview requests into guard decisions
//! - **Telemetry**: Optional, injected usage event sink
//! - **Controller**: kube-runtime watch loop driving the reconciler

pub mod admission;
pub mod controller;
pub mod error;
pub mod guard;
pub mod probe;
pub mod reconciler;
pub mod release;
pub mod resolver;
pub mod status;
pub mod store;
pub mod telemetry;

pub use controller::{KubeReconciler, action_for, kube_reconciler, run_controller};
pub use error::{ComponentErrors, KubeError, Result};
pub use guard::{DeletePolicy, DeletionGuard, Verdict};
pub use probe::{CapabilityProbe, CertManagerProbe, StaticProbe};
pub use reconciler::{ManagementReconciler, PassOutcome, PassSummary};
pub use release::{
    ApplyResult, HelmReleaseApplier, MockReleaseApplier, ReleaseApplier, ReleaseRequest,
    helm_release_manifest,
};
pub use resolver::{ComponentRole, ResolvedComponent, resolve_components};
pub use status::StatusAggregator;
pub use store::{ClusterStore, ConsumerRef, KubeStore, MockClusterStore, OperationCounts};
pub use telemetry::{
    LogSink, MANAGEMENT_RECONCILE_EVENT, NoopSink, SegmentSink, Telemetry, TelemetrySink,
};
pub use admission::review_template;
