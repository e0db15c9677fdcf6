//! Manifest cache: what was last applied for an installation
//!
//! Install diffs the freshly rendered manifest against the cached one to find
//! objects that must be removed, and uninstall deletes what the cache lists.
//! Two backends are provided:
//! - **In-memory**: process-local, lost on restart
//! - **Secret**: one Kubernetes Secret per installation, optionally compressed
//!
//! A missing entry is never an error: `get` returns an empty
//! [`ContextManifest`] and `delete` succeeds.

mod memory;
mod secret;

pub use memory::InMemoryManifestCache;
pub use secret::{
    CACHE_DATA_KEY, CACHE_SECRET_TYPE, COMPRESSION_LABEL, MANAGED_BY_LABEL, SecretCacheConfig,
    SecretManifestCache,
};

use async_trait::async_trait;
use bosun_core::Flags;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cluster::ObjectKey;
use crate::error::{KubeError, Result};

/// Manifest applied by a manager, with the flags it was rendered from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextManifest {
    #[serde(rename = "ManagerUID", default)]
    pub manager_uid: String,

    #[serde(rename = "CustomFlags", default, deserialize_with = "null_as_default")]
    pub custom_flags: Flags,

    #[serde(rename = "Manifest", default)]
    pub manifest: String,
}

impl ContextManifest {
    /// True when nothing has been cached
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keyed store of [`ContextManifest`]s
///
/// Implementations must be Send + Sync and safe for concurrent use.
#[async_trait]
pub trait ManifestCache: Send + Sync {
    /// Store `manifest` under `key`, replacing any previous entry
    async fn set(&self, key: &ObjectKey, manifest: ContextManifest) -> Result<()>;

    /// Entry under `key`, or an empty manifest when there is none
    async fn get(&self, key: &ObjectKey) -> Result<ContextManifest>;

    /// Remove the entry under `key`; removing a missing entry succeeds
    async fn delete(&self, key: &ObjectKey) -> Result<()>;
}

/// Compression method for cached manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// No compression
    #[default]
    None,

    /// Gzip compression
    Gzip { level: u32 },

    /// Zstd compression (better ratio, faster)
    Zstd { level: i32 },
}

impl CompressionMethod {
    /// Value recorded in the compression label
    pub fn label_value(&self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Gzip { .. } => "gzip",
            CompressionMethod::Zstd { .. } => "zstd",
        }
    }

    /// Method for a compression label value; entries without the label are uncompressed
    pub fn from_label(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("none") => Ok(CompressionMethod::None),
            Some("gzip") => Ok(CompressionMethod::Gzip { level: 6 }),
            Some("zstd") => Ok(CompressionMethod::Zstd { level: 3 }),
            Some(other) => Err(KubeError::Compression(format!(
                "unknown compression method '{other}'"
            ))),
        }
    }
}

/// Compress data using the configured method
#[must_use = "compression result should be used"]
pub fn compress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::Gzip { level } => {
            use std::io::Write;
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
            encoder
                .write_all(data)
                .map_err(|e| KubeError::Compression(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| KubeError::Compression(e.to_string()))
        }
        CompressionMethod::Zstd { level } => zstd::encode_all(std::io::Cursor::new(data), level)
            .map_err(|e| KubeError::Compression(e.to_string())),
    }
}

/// Decompress data
#[must_use = "decompression result should be used"]
pub fn decompress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::Gzip { .. } => {
            use std::io::Read;
            let mut decoder = flate2::read::GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| KubeError::Compression(e.to_string()))?;
            Ok(decompressed)
        }
        CompressionMethod::Zstd { .. } => zstd::decode_all(std::io::Cursor::new(data))
            .map_err(|e| KubeError::Compression(e.to_string())),
    }
}
