//! HMC Core - API types for the HMC management operator
//!
//! This crate provides the foundational types shared by the controller and the CLI:
//! - `Management`: The root object describing the desired core and provider components
//! - `Template`: A validated, reusable descriptor of a deployable component
//! - `ManagedCluster`: A workload cluster built from a cluster template
//! - `CoreValues`: Typed view over the core component configuration
//! - `OperatorConfig`: Controller settings loaded from YAML

pub mod cluster;
pub mod config;
pub mod error;
pub mod management;
pub mod template;
pub mod values;

pub use cluster::{ManagedCluster, ManagedClusterSpec, TEMPLATE_FIELD};
pub use config::{OperatorConfig, TelemetryConfig};
pub use error::{CoreError, Result};
pub use management::{
    Component, ComponentStatus, Core, Management, ManagementSpec, ManagementStatus, Providers,
};
pub use template::{ChartRef, HelmSpec, Template, TemplateKind, TemplateSpec, TemplateStatus};
pub use values::{AdmissionWebhookValues, CoreValues};

/// API group of every HMC resource
pub const GROUP: &str = "hmc.mirantis.com";

/// API version served for HMC resources
pub const VERSION: &str = "v1alpha1";

/// Namespace holding the controller, its templates and its releases
pub const DEFAULT_NAMESPACE: &str = "hmc-system";

/// Finalizer marking a Management as under active management
pub const MANAGEMENT_FINALIZER: &str = "hmc.mirantis.com/management";

/// Template used for the core service when none is configured
pub const DEFAULT_CORE_HMC_TEMPLATE: &str = "hmc";

/// Template used for the cluster-api layer when none is configured
pub const DEFAULT_CORE_CAPI_TEMPLATE: &str = "cluster-api";
