//! Mock cluster store for testing
//!
//! This store keeps objects in memory and mimics the API server's
//! resourceVersion/generation bookkeeping, useful for unit tests
//! without requiring a Kubernetes cluster.

use async_trait::async_trait;
use hmc_core::{ManagedCluster, Management, Template};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::{ClusterStore, ConsumerRef, missing_metadata};
use crate::error::{KubeError, Result};

type Key = (String, String);

fn server_error(message: impl Into<String>) -> KubeError {
    KubeError::Api(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: message.into(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

/// In-memory cluster store for testing
#[derive(Clone, Default)]
pub struct MockClusterStore {
    state: Arc<RwLock<MockState>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

#[derive(Default)]
struct MockState {
    managements: HashMap<Key, Management>,
    templates: HashMap<Key, Template>,
    clusters: Vec<ManagedCluster>,
    /// Template names whose reads fail with a server error
    broken_templates: HashSet<String>,
    /// Number of upcoming status writes that race with another writer
    racing_status_writes: usize,
    /// Number of upcoming status writes rejected by the server
    failing_status_writes: usize,
    last_resource_version: u64,
}

impl MockState {
    fn next_resource_version(&mut self) -> String {
        self.last_resource_version += 1;
        self.last_resource_version.to_string()
    }
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub management_gets: usize,
    pub management_updates: usize,
    pub status_updates: usize,
    pub template_gets: usize,
    pub consumer_lookups: usize,
}

impl MockClusterStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a Management as if created through the API server
    ///
    /// Fills in namespace, uid, generation and resourceVersion when missing.
    pub fn add_management(&self, mut management: Management) -> Management {
        let mut state = self.state.write().unwrap();
        let name = management.name_any();
        let meta = &mut management.metadata;
        meta.namespace.get_or_insert_with(|| "hmc-system".to_string());
        meta.uid.get_or_insert_with(|| format!("uid-{}", name));
        meta.generation.get_or_insert(1);
        meta.resource_version = Some(state.next_resource_version());

        let key = (management.namespace().unwrap_or_default(), name);
        state.managements.insert(key, management.clone());
        management
    }

    /// Current stored copy of a Management
    pub fn management(&self, namespace: &str, name: &str) -> Option<Management> {
        let state = self.state.read().unwrap();
        state
            .managements
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Set the deletion timestamp, as the API server does on delete with finalizers
    pub fn mark_deleting(&self, namespace: &str, name: &str) {
        let mut state = self.state.write().unwrap();
        let resource_version = state.next_resource_version();
        if let Some(mgmt) = state
            .managements
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            mgmt.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
            mgmt.metadata.resource_version = Some(resource_version);
        }
    }

    pub fn add_template(&self, template: Template) {
        let mut state = self.state.write().unwrap();
        let key = (template.namespace().unwrap_or_default(), template.name_any());
        state.templates.insert(key, template);
    }

    /// Make every read of the named template fail with a server error
    pub fn break_template(&self, name: &str) {
        let mut state = self.state.write().unwrap();
        state.broken_templates.insert(name.to_string());
    }

    pub fn add_managed_cluster(&self, cluster: ManagedCluster) {
        let mut state = self.state.write().unwrap();
        state.clusters.push(cluster);
    }

    pub fn remove_managed_cluster(&self, namespace: &str, name: &str) {
        let mut state = self.state.write().unwrap();
        state
            .clusters
            .retain(|c| !(c.namespace().as_deref() == Some(namespace) && c.name_any() == name));
    }

    /// Make the next status write lose a race against another writer
    pub fn race_next_status_write(&self) {
        let mut state = self.state.write().unwrap();
        state.racing_status_writes += 1;
    }

    /// Make the next status write fail with a server error
    pub fn fail_next_status_write(&self) {
        let mut state = self.state.write().unwrap();
        state.failing_status_writes += 1;
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    /// Look up the stored copy and reject stale writes
    fn checked_key(state: &MockState, management: &Management) -> Result<Key> {
        let namespace = management
            .namespace()
            .ok_or_else(|| missing_metadata("Management", "namespace"))?;
        let key = (namespace.clone(), management.name_any());
        let stored = state.managements.get(&key).ok_or_else(|| KubeError::NotFound {
            kind: "Management".to_string(),
            name: key.1.clone(),
            namespace,
        })?;

        if stored.metadata.resource_version != management.metadata.resource_version {
            return Err(KubeError::Conflict {
                kind: "Management".to_string(),
                name: key.1.clone(),
            });
        }
        Ok(key)
    }
}

#[async_trait]
impl ClusterStore for MockClusterStore {
    async fn get_management(&self, namespace: &str, name: &str) -> Result<Option<Management>> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.management_gets += 1;
        }

        Ok(self.management(namespace, name))
    }

    async fn update_management(&self, management: &Management) -> Result<Management> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.management_updates += 1;
        }

        let mut state = self.state.write().unwrap();
        let key = Self::checked_key(&state, management)?;
        let resource_version = state.next_resource_version();

        let stored = state
            .managements
            .get_mut(&key)
            .ok_or_else(|| missing_metadata("Management", "name"))?;
        if stored.spec != management.spec {
            stored.metadata.generation = Some(stored.generation() + 1);
        }
        stored.spec = management.spec.clone();
        stored.metadata.finalizers = management.metadata.finalizers.clone();
        stored.metadata.labels = management.metadata.labels.clone();
        stored.metadata.annotations = management.metadata.annotations.clone();
        stored.metadata.resource_version = Some(resource_version);

        Ok(stored.clone())
    }

    async fn update_management_status(&self, management: &Management) -> Result<Management> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.status_updates += 1;
        }

        let mut state = self.state.write().unwrap();
        if state.failing_status_writes > 0 {
            state.failing_status_writes -= 1;
            return Err(server_error("etcdserver: leader changed"));
        }
        if state.racing_status_writes > 0 {
            state.racing_status_writes -= 1;
            let resource_version = state.next_resource_version();
            let key = (
                management.namespace().unwrap_or_default(),
                management.name_any(),
            );
            if let Some(stored) = state.managements.get_mut(&key) {
                stored.metadata.resource_version = Some(resource_version);
            }
        }

        let key = Self::checked_key(&state, management)?;
        let resource_version = state.next_resource_version();

        let stored = state
            .managements
            .get_mut(&key)
            .ok_or_else(|| missing_metadata("Management", "name"))?;
        stored.status = management.status.clone();
        stored.metadata.resource_version = Some(resource_version);

        Ok(stored.clone())
    }

    async fn get_template(&self, namespace: &str, name: &str) -> Result<Template> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.template_gets += 1;
        }

        let state = self.state.read().unwrap();
        if state.broken_templates.contains(name) {
            return Err(server_error(format!(
                "etcdserver: request timed out reading {}",
                name
            )));
        }

        state
            .templates
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| KubeError::NotFound {
                kind: "Template".to_string(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
    }

    async fn find_template_consumer(&self, template: &str) -> Result<Option<ConsumerRef>> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.consumer_lookups += 1;
        }

        let state = self.state.read().unwrap();
        Ok(state
            .clusters
            .iter()
            .find(|c| c.references_template(template))
            .map(ConsumerRef::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmc_core::{ManagedClusterSpec, ManagementSpec, TemplateSpec, TemplateStatus};

    fn template(name: &str) -> Template {
        let mut template = Template::new(name, TemplateSpec::default());
        template.metadata.namespace = Some("hmc-system".to_string());
        template.status = Some(TemplateStatus {
            valid: true,
            ..Default::default()
        });
        template
    }

    fn cluster(namespace: &str, name: &str, template: &str) -> ManagedCluster {
        let mut cluster = ManagedCluster::new(
            name,
            ManagedClusterSpec {
                template: template.to_string(),
                ..Default::default()
            },
        );
        cluster.metadata.namespace = Some(namespace.to_string());
        cluster
    }

    #[tokio::test]
    async fn test_mock_add_and_get_management() {
        let store = MockClusterStore::new();
        let stored = store.add_management(Management::new("hmc", ManagementSpec::default()));

        assert_eq!(stored.metadata.namespace.as_deref(), Some("hmc-system"));
        assert_eq!(stored.metadata.generation, Some(1));
        assert!(stored.metadata.uid.is_some());

        let fetched = store.get_management("hmc-system", "hmc").await.unwrap();
        assert_eq!(fetched, Some(stored));
        assert_eq!(store.operation_counts().management_gets, 1);
    }

    #[tokio::test]
    async fn test_mock_get_missing_management() {
        let store = MockClusterStore::new();
        assert!(store.get_management("hmc-system", "hmc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_update_bumps_generation_on_spec_change() {
        let store = MockClusterStore::new();
        let mut mgmt = store.add_management(Management::new("hmc", ManagementSpec::default()));

        mgmt.add_finalizer();
        let mgmt = store.update_management(&mgmt).await.unwrap();
        assert_eq!(mgmt.generation(), 1);

        let mut mgmt = mgmt;
        mgmt.apply_default_core("hmc", "cluster-api");
        let mgmt = store.update_management(&mgmt).await.unwrap();
        assert_eq!(mgmt.generation(), 2);
        assert!(mgmt.has_finalizer());
    }

    #[tokio::test]
    async fn test_mock_rejects_stale_write() {
        let store = MockClusterStore::new();
        let original = store.add_management(Management::new("hmc", ManagementSpec::default()));

        let mut first = original.clone();
        first.add_finalizer();
        store.update_management(&first).await.unwrap();

        let result = store.update_management_status(&original).await;
        assert!(matches!(result, Err(KubeError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_mock_failing_status_write() {
        let store = MockClusterStore::new();
        let mgmt = store.add_management(Management::new("hmc", ManagementSpec::default()));

        store.fail_next_status_write();
        let err = store.update_management_status(&mgmt).await.unwrap_err();
        assert!(!err.is_conflict());
        assert!(store.update_management_status(&mgmt).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_racing_status_write() {
        let store = MockClusterStore::new();
        let mgmt = store.add_management(Management::new("hmc", ManagementSpec::default()));

        store.race_next_status_write();
        let result = store.update_management_status(&mgmt).await;
        assert!(result.unwrap_err().is_conflict());

        // A fresh read succeeds
        let fresh = store.management("hmc-system", "hmc").unwrap();
        assert!(store.update_management_status(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_template_lookup() {
        let store = MockClusterStore::new();
        store.add_template(template("hmc"));

        assert!(store.get_template("hmc-system", "hmc").await.is_ok());
        let missing = store.get_template("hmc-system", "capi").await.unwrap_err();
        assert!(missing.is_not_found());

        store.break_template("hmc");
        let broken = store.get_template("hmc-system", "hmc").await.unwrap_err();
        assert!(!broken.is_not_found());
    }

    #[tokio::test]
    async fn test_mock_consumer_lookup() {
        let store = MockClusterStore::new();
        store.add_managed_cluster(cluster("team-a", "dev", "aws-standalone-cp"));

        let found = store.find_template_consumer("aws-standalone-cp").await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("dev".to_string()));
        assert!(store.find_template_consumer("azure").await.unwrap().is_none());

        store.remove_managed_cluster("team-a", "dev");
        assert!(
            store
                .find_template_consumer("aws-standalone-cp")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.operation_counts().consumer_lookups, 3);
    }
}
