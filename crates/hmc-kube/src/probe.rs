//! Capability probes run before a convergence pass
//!
//! The core service serves admission webhooks whose certificates are issued by
//! cert-manager, so the cert-manager API must be present before anything is
//! applied.

use async_trait::async_trait;
use kube::Client;
use kube::core::GroupVersionKind;
use kube::discovery::Discovery;
use tracing::debug;

use crate::error::{KubeError, Result};

const CERT_MANAGER_GROUP: &str = "cert-manager.io";
const CERT_MANAGER_VERSION: &str = "v1";

/// Kinds the core service relies on
const REQUIRED_KINDS: &[&str] = &["Certificate", "Issuer"];

/// Probe for an external capability the pass cannot run without
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Succeeds when the capability is available for `namespace`
    async fn verify(&self, namespace: &str) -> Result<()>;
}

/// Checks that the cert-manager API is served by the cluster
pub struct CertManagerProbe {
    client: Client,
}

impl CertManagerProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CapabilityProbe for CertManagerProbe {
    async fn verify(&self, namespace: &str) -> Result<()> {
        let discovery = Discovery::new(self.client.clone())
            .filter(&[CERT_MANAGER_GROUP])
            .run()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        for kind in REQUIRED_KINDS {
            let gvk = GroupVersionKind::gvk(CERT_MANAGER_GROUP, CERT_MANAGER_VERSION, kind);
            if discovery.resolve_gvk(&gvk).is_none() {
                return Err(unavailable(format!(
                    "{}/{} {} is not served",
                    CERT_MANAGER_GROUP, CERT_MANAGER_VERSION, kind
                )));
            }
        }

        debug!(namespace, "cert-manager API is available");
        Ok(())
    }
}

/// Probe with a fixed answer, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    failure: Option<String>,
}

impl StaticProbe {
    pub fn available() -> Self {
        Self { failure: None }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
        }
    }
}

#[async_trait]
impl CapabilityProbe for StaticProbe {
    async fn verify(&self, _namespace: &str) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

fn unavailable(cause: String) -> KubeError {
    KubeError::PrerequisiteMissing(format!(
        "failed to check if the cert-manager API is installed: {}",
        cause
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_probe() {
        assert!(StaticProbe::available().verify("hmc-system").await.is_ok());

        let err = StaticProbe::unavailable("no matches for kind Certificate")
            .verify("hmc-system")
            .await
            .unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"prerequisite not satisfied: failed to check if the cert-manager API is installed: no matches for kind Certificate"
        );
    }
}
