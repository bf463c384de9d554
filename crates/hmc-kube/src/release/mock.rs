//! Mock release applier for testing
//!
//! Records every request in order and keeps the last applied manifest per
//! release, so repeated identical applies report `changed == false`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::{ApplyResult, ReleaseApplier, ReleaseRequest, helm_release_manifest};
use crate::error::{KubeError, Result};

/// In-memory release applier
#[derive(Clone, Default)]
pub struct MockReleaseApplier {
    state: Arc<RwLock<MockState>>,
}

#[derive(Default)]
struct MockState {
    requests: Vec<ReleaseRequest>,
    applied: HashMap<(String, String), Value>,
    failing: HashSet<String>,
}

impl MockReleaseApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply of the named release fail
    pub fn fail_release(&self, name: &str) {
        self.state.write().unwrap().failing.insert(name.to_string());
    }

    /// All requests received, in call order
    pub fn requests(&self) -> Vec<ReleaseRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// Names of the requested releases, in call order
    pub fn applied_names(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .requests
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Last manifest stored for a release
    pub fn manifest(&self, namespace: &str, name: &str) -> Option<Value> {
        self.state
            .read()
            .unwrap()
            .applied
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn clear_requests(&self) {
        self.state.write().unwrap().requests.clear();
    }
}

#[async_trait]
impl ReleaseApplier for MockReleaseApplier {
    async fn apply(&self, request: &ReleaseRequest) -> Result<ApplyResult> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request.clone());

        if state.failing.contains(&request.name) {
            return Err(KubeError::Release {
                name: request.name.clone(),
                message: "install retries exhausted".to_string(),
            });
        }

        let manifest = helm_release_manifest(request)?;
        let key = (request.namespace.clone(), request.name.clone());
        let changed = state.applied.get(&key) != Some(&manifest);
        state.applied.insert(key, manifest);

        Ok(ApplyResult {
            applied: true,
            changed,
        })
    }
}
