//! CLI commands

use std::sync::Arc;

use bosun_kube::{
    ClusterClient, CompressionMethod, Installer, InstallerBuilder, KubeCluster, ObjectKey,
    SecretCacheConfig, SecretManifestCache,
};
use clap::{Args, ValueEnum};

use crate::error::Result;

pub mod install;
pub mod uninstall;
pub mod verify;

/// Which installation a command acts on
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Installation name; also names the cache Secret
    #[arg(long)]
    pub name: String,

    /// Namespace of the cache Secret and default namespace for rendered objects
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Field manager for server-side apply
    #[arg(long, default_value = "bosun", env = "BOSUN_MANAGER_NAME")]
    pub manager_name: String,

    /// UID of the owning manager, recorded in the cache
    #[arg(long, default_value = "", env = "BOSUN_MANAGER_UID")]
    pub manager_uid: String,

    /// Compression for newly written cache entries
    #[arg(long, value_enum, default_value_t = Compression::None)]
    pub compression: Compression,
}

impl TargetArgs {
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => CompressionMethod::None,
            Compression::Gzip => CompressionMethod::Gzip { level: 6 },
            Compression::Zstd => CompressionMethod::Zstd { level: 3 },
        }
    }
}

/// Connect to the cluster and prepare an installer for `target`
///
/// The returned builder still accepts a renderer.
pub async fn connect(target: &TargetArgs) -> Result<InstallerBuilder> {
    let cluster: Arc<dyn ClusterClient> =
        Arc::new(KubeCluster::for_namespace(&target.namespace).await?);
    let cache = SecretManifestCache::with_config(
        Arc::clone(&cluster),
        SecretCacheConfig {
            compression: target.compression.into(),
        },
    );

    Ok(Installer::builder()
        .cluster(cluster)
        .cache(Arc::new(cache))
        .cache_key(target.key())
        .manager_name(&target.manager_name)
        .manager_uid(&target.manager_uid))
}
