//! Error types for hmc-kube

use thiserror::Error;

/// Result type for hmc-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object not found
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// Optimistic concurrency failure: the object changed since it was read
    #[error("conflict writing {kind} '{name}': the object has been modified")]
    Conflict { kind: String, name: String },

    /// A hard prerequisite of the convergence pass is missing
    #[error("prerequisite not satisfied: {0}")]
    PrerequisiteMissing(String),

    /// Release could not be applied
    #[error("release '{name}' could not be applied: {message}")]
    Release { name: String, message: String },

    /// One or more components failed during a pass
    #[error(transparent)]
    Components(#[from] ComponentErrors),

    /// Invalid component or operator configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Telemetry delivery failed
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<hmc_core::CoreError> for KubeError {
    fn from(e: hmc_core::CoreError) -> Self {
        KubeError::InvalidConfig(e.to_string())
    }
}

impl From<reqwest::Error> for KubeError {
    fn from(e: reqwest::Error) -> Self {
        KubeError::Telemetry(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::NotFound { .. })
            || matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Conflict { .. })
            || matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// Map a write error, turning 409 responses into [`KubeError::Conflict`]
    pub fn from_write(err: kube::Error, kind: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 409 => KubeError::Conflict {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            other => KubeError::Api(other),
        }
    }
}

/// All component failures of one convergence pass, one message per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .0.join("\n"))]
pub struct ComponentErrors(pub Vec<String>);

impl ComponentErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// `None` when nothing failed
    pub fn into_result(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}
