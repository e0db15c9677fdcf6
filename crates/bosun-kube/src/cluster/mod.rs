//! Access to the Kubernetes cluster
//!
//! The reconciliation core talks to the cluster through [`ClusterClient`],
//! which covers exactly what install, uninstall, verification and the
//! Secret-backed cache need:
//! - **Apply**: server-side apply with forced field ownership
//! - **Delete**: background deletion, reporting whether the object is gone
//! - **Get**: typed reads of Deployments and Secrets
//!
//! Two implementations are provided: [`KubeCluster`] backed by a live
//! `kube::Client`, and [`MockCluster`] for tests.

mod live;
mod mock;

pub use live::KubeCluster;
pub use mock::{MockCluster, OperationCounts};

use std::fmt;

use async_trait::async_trait;
use bosun_core::Resource;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;

use crate::error::Result;

/// Namespace and name of a single object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a resource, ignoring its kind
    pub fn of(resource: &Resource) -> Self {
        Self::new(resource.namespace(), resource.name())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of a delete request that the cluster accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStatus {
    /// The object no longer exists
    Deleted,
    /// The object still exists, e.g. while finalizers run
    InProgress,
}

/// Cluster operations used by the reconciliation core
///
/// Implementations must be Send + Sync for use across async tasks.
/// Missing objects are reported as errors for which
/// [`KubeError::is_not_found`](crate::KubeError::is_not_found) is true.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Server-side apply `resource`, forcing ownership under `field_manager`
    async fn apply(&self, resource: &Resource, field_manager: &str) -> Result<()>;

    /// Delete `resource` with background propagation
    async fn delete(&self, resource: &Resource) -> Result<DeletionStatus>;

    /// Read the live state of a Deployment
    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment>;

    /// Read a Secret
    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret>;

    /// Replace an existing Secret
    async fn update_secret(&self, secret: &Secret) -> Result<()>;

    /// Create a Secret that does not exist yet
    async fn create_secret(&self, secret: &Secret) -> Result<()>;

    /// Delete a Secret
    async fn delete_secret(&self, key: &ObjectKey) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_display() {
        assert_eq!(ObjectKey::new("kyma-system", "cache").to_string(), "kyma-system/cache");
    }

    #[test]
    fn test_object_key_of_resource() {
        let resource = Resource::new("v1", "ConfigMap", "settings").with_namespace("prod");
        assert_eq!(ObjectKey::of(&resource), ObjectKey::new("prod", "settings"));
    }
}
