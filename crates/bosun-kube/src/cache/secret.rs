//! Manifest cache stored in Kubernetes Secrets
//!
//! Each key maps to one Secret with the same namespace and name. The entry is
//! JSON under the `spec` data key, compressed according to
//! [`SecretCacheConfig`]. The method is recorded in a label so entries written
//! with different settings, or without the label, stay readable.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::{CompressionMethod, ContextManifest, ManifestCache, compress, decompress};
use crate::cluster::{ClusterClient, ObjectKey};
use crate::error::{KubeError, Result};

/// Data key holding the serialized entry
pub const CACHE_DATA_KEY: &str = "spec";

/// Secret type of cache entries; matches Secrets written by other cache clients
pub const CACHE_SECRET_TYPE: &str = "Opaque";

/// Label recording the compression method
pub const COMPRESSION_LABEL: &str = "bosun.io/compression";

/// Standard managed-by label
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Secret cache configuration
#[derive(Debug, Clone, Default)]
pub struct SecretCacheConfig {
    /// Compression applied to new entries
    pub compression: CompressionMethod,
}

/// [`ManifestCache`] backed by one Secret per key
pub struct SecretManifestCache {
    cluster: Arc<dyn ClusterClient>,
    config: SecretCacheConfig,
}

impl SecretManifestCache {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self::with_config(cluster, SecretCacheConfig::default())
    }

    pub fn with_config(cluster: Arc<dyn ClusterClient>, config: SecretCacheConfig) -> Self {
        Self { cluster, config }
    }

    fn build_secret(&self, key: &ObjectKey, manifest: &ContextManifest) -> Result<Secret> {
        let json = serde_json::to_vec(manifest)?;
        let payload = compress(&json, self.config.compression)?;

        let labels = BTreeMap::from([
            (MANAGED_BY_LABEL.to_string(), "bosun".to_string()),
            (
                COMPRESSION_LABEL.to_string(),
                self.config.compression.label_value().to_string(),
            ),
        ]);

        Ok(Secret {
            metadata: ObjectMeta {
                name: Some(key.name.clone()),
                namespace: Some(key.namespace.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            type_: Some(CACHE_SECRET_TYPE.to_string()),
            data: Some(BTreeMap::from([(
                CACHE_DATA_KEY.to_string(),
                ByteString(payload),
            )])),
            ..Default::default()
        })
    }
}

/// Decode the entry stored in a cache Secret
fn parse_secret(secret: &Secret) -> Result<ContextManifest> {
    let data = secret
        .data
        .as_ref()
        .and_then(|d| d.get(CACHE_DATA_KEY))
        .ok_or_else(|| KubeError::Cache(format!("secret missing '{CACHE_DATA_KEY}' data")))?;

    let compression = CompressionMethod::from_label(
        secret
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(COMPRESSION_LABEL))
            .map(String::as_str),
    )?;

    let json = decompress(&data.0, compression)?;
    Ok(serde_json::from_slice(&json)?)
}

#[async_trait]
impl ManifestCache for SecretManifestCache {
    async fn set(&self, key: &ObjectKey, manifest: ContextManifest) -> Result<()> {
        let secret = self.build_secret(key, &manifest)?;

        match self.cluster.update_secret(&secret).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "creating manifest cache secret");
                self.cluster.create_secret(&secret).await
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, key: &ObjectKey) -> Result<ContextManifest> {
        match self.cluster.get_secret(key).await {
            Ok(secret) => parse_secret(&secret),
            Err(e) if e.is_not_found() => Ok(ContextManifest::default()),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<()> {
        match self.cluster.delete_secret(key).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }
}
