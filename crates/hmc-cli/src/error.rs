//! CLI error types with exit code handling

use hmc_core::CoreError;
use hmc_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI error type carrying its exit code
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration file missing or invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(hmc::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Kubernetes API unreachable or failing
    #[error("Kubernetes error: {message}")]
    #[diagnostic(code(hmc::cli::kube))]
    Kube {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A convergence pass recorded component failures
    #[error("Reconciliation failed:\n{message}")]
    #[diagnostic(code(hmc::cli::reconcile))]
    Reconcile { message: String },

    /// Template deletion would be refused
    #[error("Deletion denied: {reason}")]
    #[diagnostic(code(hmc::cli::denied))]
    Denied { reason: String },

    /// IO error (bind failure, unreadable file, ...)
    #[error("IO error: {message}")]
    #[diagnostic(code(hmc::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(hmc::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Kube { .. } => exit_codes::UNAVAILABLE,
            CliError::Reconcile { .. } => exit_codes::RECONCILE_ERROR,
            CliError::Denied { .. } => exit_codes::DENIED,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some("check the file passed with --config or HMC_CONFIG".to_string()),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::config(format!("cannot read configuration: {}", e)),
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Components(errors) => CliError::Reconcile {
                message: errors.to_string(),
            },
            KubeError::InvalidConfig(message) => CliError::Config {
                message,
                help: None,
            },
            KubeError::Api(_) => CliError::Kube {
                message: err.to_string(),
                help: Some("check your kubeconfig and that the cluster is reachable".to_string()),
            },
            other => CliError::Kube {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<kube::Error> for CliError {
    fn from(err: kube::Error) -> Self {
        CliError::from(KubeError::Api(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hmc_kube::ComponentErrors;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::config("bad").exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(CliError::denied("no").exit_code(), exit_codes::DENIED);
        assert_eq!(CliError::internal("boom").exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_component_errors_map_to_reconcile() {
        let errors = ComponentErrors(vec![
            "Template hmc-system/azure is not marked as valid".to_string(),
            "failed to get Template hmc-system/gcp: not found".to_string(),
        ]);
        let err = CliError::from(KubeError::from(errors));

        assert_eq!(err.exit_code(), exit_codes::RECONCILE_ERROR);
        insta::assert_snapshot!(err.to_string(), @r"
        Reconciliation failed:
        Template hmc-system/azure is not marked as valid
        failed to get Template hmc-system/gcp: not found
        ");
    }

    #[test]
    fn test_prerequisite_maps_to_kube() {
        let err = CliError::from(KubeError::PrerequisiteMissing("no cert-manager".to_string()));
        assert_eq!(err.exit_code(), exit_codes::UNAVAILABLE);
    }
}
