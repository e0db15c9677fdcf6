//! In-memory cluster for testing
//!
//! Stores applied objects by identity and simulates the parts of the API
//! server the reconciliation core depends on: finalizers that keep an object
//! around after a delete request, asynchronous deletion, injected failures
//! and Deployment status.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bosun_core::{Resource, ResourceKey};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;

use super::{ClusterClient, DeletionStatus, ObjectKey};
use crate::error::{KubeError, Result};

/// In-memory [`ClusterClient`] for testing
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<RwLock<MockState>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub applies: usize,
    pub deletes: usize,
    pub gets: usize,
    pub secret_writes: usize,
    pub secret_deletes: usize,
}

#[derive(Default)]
struct MockState {
    objects: BTreeMap<ResourceKey, Resource>,
    field_managers: HashMap<ResourceKey, String>,
    deployments: HashMap<ObjectKey, Deployment>,
    secrets: BTreeMap<ObjectKey, Secret>,
    /// Objects whose finalizers have not completed
    held: HashSet<ResourceKey>,
    /// Delete removes the object but reports it as still in progress
    async_deletion: bool,
    apply_failures: HashMap<ResourceKey, String>,
    delete_failures: HashMap<ResourceKey, String>,
    apply_log: Vec<ResourceKey>,
    delete_log: Vec<ResourceKey>,
    operations: OperationCounts,
}

impl MockCluster {
    /// Create an empty cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-existing objects
    pub fn with_objects(objects: impl IntoIterator<Item = Resource>) -> Self {
        let cluster = Self::new();
        {
            let mut state = cluster.write();
            for object in objects {
                state.objects.insert(object.key(), object);
            }
        }
        cluster
    }

    /// Report every accepted delete as in progress, even though the object is removed
    ///
    /// This mirrors API servers that acknowledge a delete before the object is gone;
    /// the next delete of the same object then reports NotFound.
    pub fn with_async_deletion(self) -> Self {
        self.write().async_deletion = true;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an object as if it had been created out of band
    pub fn insert(&self, object: Resource) {
        self.write().objects.insert(object.key(), object);
    }

    /// Whether an object with this identity exists
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.read().objects.contains_key(key)
    }

    /// Current state of an object
    pub fn object(&self, key: &ResourceKey) -> Option<Resource> {
        self.read().objects.get(key).cloned()
    }

    /// Identities of all stored objects, sorted
    pub fn object_keys(&self) -> Vec<ResourceKey> {
        self.read().objects.keys().cloned().collect()
    }

    /// Field manager of the last apply of an object
    pub fn field_manager(&self, key: &ResourceKey) -> Option<String> {
        self.read().field_managers.get(key).cloned()
    }

    /// Keep the object after delete requests until [`release`](Self::release) is called
    pub fn hold_deletion(&self, key: &ResourceKey) {
        self.write().held.insert(key.clone());
    }

    /// Let pending finalizers complete; a held object that was deleted disappears
    pub fn release(&self, key: &ResourceKey) {
        let mut state = self.write();
        state.held.remove(key);
        let terminating = state
            .objects
            .get(key)
            .is_some_and(|o| o.field(&["metadata", "deletionTimestamp"]).is_some());
        if terminating {
            state.objects.remove(key);
        }
    }

    /// Make applies of this object fail
    pub fn fail_apply(&self, key: &ResourceKey, message: impl Into<String>) {
        self.write().apply_failures.insert(key.clone(), message.into());
    }

    /// Make deletes of this object fail
    pub fn fail_delete(&self, key: &ResourceKey, message: impl Into<String>) {
        self.write().delete_failures.insert(key.clone(), message.into());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        let mut state = self.write();
        state.apply_failures.clear();
        state.delete_failures.clear();
    }

    /// Set the live state returned for a Deployment, including status
    pub fn set_deployment(&self, deployment: Deployment) {
        let key = ObjectKey::new(
            deployment.metadata.namespace.clone().unwrap_or_default(),
            deployment.metadata.name.clone().unwrap_or_default(),
        );
        self.write().deployments.insert(key, deployment);
    }

    /// Stored Secret
    pub fn secret(&self, key: &ObjectKey) -> Option<Secret> {
        self.read().secrets.get(key).cloned()
    }

    /// Objects applied, in order
    pub fn apply_log(&self) -> Vec<ResourceKey> {
        self.read().apply_log.clone()
    }

    /// Objects a delete was requested for, in order
    pub fn delete_log(&self) -> Vec<ResourceKey> {
        self.read().delete_log.clone()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.read().operations.clone()
    }

    /// Reset operation counts and logs
    pub fn reset_counts(&self) {
        let mut state = self.write();
        state.operations = OperationCounts::default();
        state.apply_log.clear();
        state.delete_log.clear();
    }
}

fn secret_key(secret: &Secret) -> ObjectKey {
    ObjectKey::new(
        secret.metadata.namespace.clone().unwrap_or_default(),
        secret.metadata.name.clone().unwrap_or_default(),
    )
}

/// The API server defaults an empty type to Opaque
fn secret_type(secret: &Secret) -> &str {
    secret.type_.as_deref().unwrap_or("Opaque")
}

#[async_trait]
impl ClusterClient for MockCluster {
    async fn apply(&self, resource: &Resource, field_manager: &str) -> Result<()> {
        let key = resource.key();
        let mut state = self.write();
        state.operations.applies += 1;

        if let Some(message) = state.apply_failures.get(&key) {
            return Err(KubeError::Cluster(message.clone()));
        }

        state.apply_log.push(key.clone());
        state.field_managers.insert(key.clone(), field_manager.to_string());
        state.objects.insert(key, resource.clone());
        Ok(())
    }

    async fn delete(&self, resource: &Resource) -> Result<DeletionStatus> {
        let key = resource.key();
        let mut state = self.write();
        state.operations.deletes += 1;
        state.delete_log.push(key.clone());

        if let Some(message) = state.delete_failures.get(&key) {
            return Err(KubeError::Cluster(message.clone()));
        }

        if state.held.contains(&key) {
            let object = state
                .objects
                .get_mut(&key)
                .ok_or_else(|| KubeError::not_found(&key.kind, &key.namespace, &key.name))?;
            object.set_field(
                &["metadata", "deletionTimestamp"],
                serde_json::Value::String("1970-01-01T00:00:00Z".to_string()),
            );
            return Ok(DeletionStatus::InProgress);
        }

        if state.objects.remove(&key).is_none() {
            return Err(KubeError::not_found(&key.kind, &key.namespace, &key.name));
        }
        state.field_managers.remove(&key);

        if state.async_deletion {
            Ok(DeletionStatus::InProgress)
        } else {
            Ok(DeletionStatus::Deleted)
        }
    }

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment> {
        let mut state = self.write();
        state.operations.gets += 1;

        if let Some(deployment) = state.deployments.get(key) {
            return Ok(deployment.clone());
        }

        // Fall back to the applied object, which carries no status
        let applied = state
            .objects
            .get(&ResourceKey::new("Deployment", &key.namespace, &key.name))
            .ok_or_else(|| KubeError::not_found("Deployment", &key.namespace, &key.name))?;
        Ok(serde_json::from_value(applied.as_value().clone())?)
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret> {
        let mut state = self.write();
        state.operations.gets += 1;
        state
            .secrets
            .get(key)
            .cloned()
            .ok_or_else(|| KubeError::not_found("Secret", &key.namespace, &key.name))
    }

    async fn update_secret(&self, secret: &Secret) -> Result<()> {
        let key = secret_key(secret);
        let mut state = self.write();
        state.operations.secret_writes += 1;

        match state.secrets.get_mut(&key) {
            Some(existing) => {
                if secret_type(existing) != secret_type(secret) {
                    return Err(KubeError::Cluster(format!(
                        "Secret {key} is invalid: type: field is immutable ({} -> {})",
                        secret_type(existing),
                        secret_type(secret)
                    )));
                }
                *existing = secret.clone();
                Ok(())
            }
            None => Err(KubeError::not_found("Secret", &key.namespace, &key.name)),
        }
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let key = secret_key(secret);
        let mut state = self.write();
        state.operations.secret_writes += 1;

        if state.secrets.contains_key(&key) {
            return Err(KubeError::Cluster(format!("secret {key} already exists")));
        }
        state.secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn delete_secret(&self, key: &ObjectKey) -> Result<()> {
        let mut state = self.write();
        state.operations.secret_deletes += 1;
        state
            .secrets
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| KubeError::not_found("Secret", &key.namespace, &key.name))
    }
}
