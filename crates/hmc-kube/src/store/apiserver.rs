//! API-server backed cluster store

use async_trait::async_trait;
use hmc_core::{ManagedCluster, Management, TEMPLATE_FIELD, Template};
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde_json::json;

use super::{ClusterStore, ConsumerRef, missing_metadata};
use crate::error::{KubeError, Result};

/// Cluster store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    /// Create a store using the default kubeconfig / in-cluster config
    pub async fn new(field_manager: impl Into<String>) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::with_client(client, field_manager))
    }

    /// Create with an existing client
    pub fn with_client(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Get the underlying Kubernetes client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn managements(&self, namespace: &str) -> Api<Management> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Namespace and name of an object that is about to be written
    fn write_target(management: &Management) -> Result<(String, String)> {
        let namespace = management
            .namespace()
            .ok_or_else(|| missing_metadata("Management", "namespace"))?;
        let name = management
            .meta()
            .name
            .clone()
            .ok_or_else(|| missing_metadata("Management", "name"))?;
        Ok((namespace, name))
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_management(&self, namespace: &str, name: &str) -> Result<Option<Management>> {
        Ok(self.managements(namespace).get_opt(name).await?)
    }

    async fn update_management(&self, management: &Management) -> Result<Management> {
        let (namespace, name) = Self::write_target(management)?;
        if management.resource_version().is_none() {
            return Err(missing_metadata("Management", "resourceVersion"));
        }

        // PUT carries metadata.resourceVersion, so a stale object is rejected with 409
        self.managements(&namespace)
            .replace(&name, &PostParams::default(), management)
            .await
            .map_err(|e| KubeError::from_write(e, "Management", &name))
    }

    async fn update_management_status(&self, management: &Management) -> Result<Management> {
        let (namespace, name) = Self::write_target(management)?;
        let resource_version = management
            .resource_version()
            .ok_or_else(|| missing_metadata("Management", "resourceVersion"))?;

        // Server-side apply of the whole status: fields this manager no longer
        // sets (stale component entries) are removed, and the resourceVersion
        // acts as a precondition.
        let patch = json!({
            "apiVersion": Management::api_version(&()),
            "kind": Management::kind(&()),
            "metadata": {
                "name": name,
                "namespace": namespace,
                "resourceVersion": resource_version,
            },
            "status": management.status,
        });
        let params = PatchParams::apply(&self.field_manager).force();

        self.managements(&namespace)
            .patch_status(&name, &params, &Patch::Apply(&patch))
            .await
            .map_err(|e| KubeError::from_write(e, "Management", &name))
    }

    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template> {
        let api: Api<Template> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await?.ok_or_else(|| KubeError::NotFound {
            kind: "Template".to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    async fn find_template_consumer(&self, template: &str) -> Result<Option<ConsumerRef>> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        let page = api.list(&consumer_list_params(template)).await?;
        Ok(page.items.first().map(ConsumerRef::from))
    }
}

/// Existence check for clusters built from `template`: server-side filtered, one item at most
fn consumer_list_params(template: &str) -> ListParams {
    ListParams::default()
        .fields(&format!("{}={}", TEMPLATE_FIELD, template))
        .limit(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_lookup_is_single_match() {
        let params = consumer_list_params("aws-standalone-0-0-1");
        assert_eq!(
            params.field_selector.as_deref(),
            Some("spec.template=aws-standalone-0-0-1")
        );
        assert_eq!(params.limit, Some(1));
        assert_eq!(params.continue_token, None);
    }
}
