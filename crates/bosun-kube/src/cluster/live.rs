//! Cluster client backed by a live Kubernetes API server
//!
//! Resources are handled as `DynamicObject`s resolved through API discovery,
//! so any kind the server serves can be applied without compile-time types.
//! Discovery is cached and refreshed once when a kind is not known, which
//! covers custom resources whose CRD was applied earlier in the same run.

use async_trait::async_trait;
use bosun_core::Resource;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    Client, Config,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams, PropagationPolicy},
    core::GroupVersionKind,
    discovery::{ApiCapabilities, ApiResource, Discovery, Scope},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ClusterClient, DeletionStatus, ObjectKey};
use crate::error::{KubeError, Result};

/// [`ClusterClient`] over a `kube::Client`
pub struct KubeCluster {
    client: Client,
    discovery: RwLock<Discovery>,
}

impl KubeCluster {
    /// Create a cluster client, running API discovery once
    pub async fn new(client: Client) -> Result<Self> {
        let discovery = Discovery::new(client.clone()).run().await?;
        Ok(Self::with_discovery(client, discovery))
    }

    /// Create from the inferred configuration with `namespace` as the default
    ///
    /// Objects without a namespace are applied to, and deleted from, `namespace`
    /// instead of the kubeconfig context's namespace.
    pub async fn for_namespace(namespace: &str) -> Result<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| KubeError::Cluster(format!("failed to load kubeconfig: {e}")))?;
        let client = Client::try_from(with_default_namespace(config, namespace))?;
        Self::new(client).await
    }

    /// Create from an existing client and discovery (for reuse)
    pub fn with_discovery(client: Client, discovery: Discovery) -> Self {
        Self {
            client,
            discovery: RwLock::new(discovery),
        }
    }

    /// Underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Refresh the discovery cache (call after CRD changes)
    pub async fn refresh_discovery(&self) -> Result<()> {
        let discovery = Discovery::new(self.client.clone()).run().await?;
        *self.discovery.write().await = discovery;
        Ok(())
    }

    /// Resolve a resource's type, refreshing discovery once if it is unknown
    async fn resolve(&self, resource: &Resource) -> Result<Option<(ApiResource, ApiCapabilities)>> {
        let gvk = gvk_from_api_version(resource.api_version(), resource.kind());

        if let Some(found) = self.discovery.read().await.resolve_gvk(&gvk) {
            return Ok(Some(found));
        }

        debug!(
            api_version = resource.api_version(),
            kind = resource.kind(),
            "unknown resource type, refreshing discovery"
        );
        self.refresh_discovery().await?;
        Ok(self.discovery.read().await.resolve_gvk(&gvk))
    }

    fn dynamic_api(
        &self,
        resource: &Resource,
        api_resource: &ApiResource,
        capabilities: &ApiCapabilities,
    ) -> Api<DynamicObject> {
        if capabilities.scope == Scope::Namespaced {
            Api::namespaced_with(
                self.client.clone(),
                self.namespace_or_default(resource.namespace()),
                api_resource,
            )
        } else {
            Api::all_with(self.client.clone(), api_resource)
        }
    }

    fn namespace_or_default<'a>(&'a self, namespace: &'a str) -> &'a str {
        if namespace.is_empty() {
            self.client.default_namespace()
        } else {
            namespace
        }
    }

    fn secrets_api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), self.namespace_or_default(namespace))
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn apply(&self, resource: &Resource, field_manager: &str) -> Result<()> {
        let (api_resource, capabilities) =
            self.resolve(resource)
                .await?
                .ok_or_else(|| KubeError::UnknownResource {
                    api_version: resource.api_version().to_string(),
                    kind: resource.kind().to_string(),
                })?;

        let obj: DynamicObject = serde_json::from_value(resource.as_value().clone())?;
        let api = self.dynamic_api(resource, &api_resource, &capabilities);

        let params = PatchParams::apply(field_manager).force();
        api.patch(resource.name(), &params, &Patch::Apply(&obj))
            .await?;

        Ok(())
    }

    async fn delete(&self, resource: &Resource) -> Result<DeletionStatus> {
        // A type the server does not serve cannot have instances
        let Some((api_resource, capabilities)) = self.resolve(resource).await? else {
            return Err(KubeError::not_found(
                resource.kind(),
                resource.namespace(),
                resource.name(),
            ));
        };

        let api = self.dynamic_api(resource, &api_resource, &capabilities);
        let params = DeleteParams {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Default::default()
        };

        match api.delete(resource.name(), &params).await {
            Ok(outcome) if outcome.is_left() => Ok(DeletionStatus::InProgress),
            Ok(_) => Ok(DeletionStatus::Deleted),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Err(KubeError::not_found(
                resource.kind(),
                resource.namespace(),
                resource.name(),
            )),
            Err(e) => Err(KubeError::Api(e)),
        }
    }

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment> {
        let api: Api<Deployment> =
            Api::namespaced(self.client.clone(), self.namespace_or_default(&key.namespace));

        match api.get(&key.name).await {
            Ok(deployment) => Ok(deployment),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                Err(KubeError::not_found("Deployment", &key.namespace, &key.name))
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Secret> {
        match self.secrets_api(&key.namespace).get(&key.name).await {
            Ok(secret) => Ok(secret),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                Err(KubeError::not_found("Secret", &key.namespace, &key.name))
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }

    async fn update_secret(&self, secret: &Secret) -> Result<()> {
        let namespace = secret.metadata.namespace.as_deref().unwrap_or_default();
        let name = secret.metadata.name.as_deref().unwrap_or_default();

        match self
            .secrets_api(namespace)
            .replace(name, &PostParams::default(), secret)
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                Err(KubeError::not_found("Secret", namespace, name))
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let namespace = secret.metadata.namespace.as_deref().unwrap_or_default();
        self.secrets_api(namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn delete_secret(&self, key: &ObjectKey) -> Result<()> {
        match self
            .secrets_api(&key.namespace)
            .delete(&key.name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                Err(KubeError::not_found("Secret", &key.namespace, &key.name))
            }
            Err(e) => Err(KubeError::Api(e)),
        }
    }
}

/// Split an apiVersion into group and version:
/// - "apps/v1" -> group="apps", version="v1"
/// - "v1" -> group="", version="v1" (core API)
fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = match api_version.rsplit_once('/') {
        Some((g, v)) => (g, v),
        None => ("", api_version),
    };

    GroupVersionKind::gvk(group, version, kind)
}

fn with_default_namespace(mut config: Config, namespace: &str) -> Config {
    if !namespace.is_empty() {
        config.default_namespace = namespace.to_string();
    }
    config
}
