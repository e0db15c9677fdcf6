//! The installer: one installation of a chart by one manager
//!
//! An [`Installer`] binds together everything install, uninstall and verify
//! need: the cluster, the manifest cache and the key the installation is
//! cached under, the renderer, and the identity of the managing component.
//! It holds no per-run state, so one installer can be reused for every
//! reconciliation of the same installation.

use std::fmt;
use std::sync::Arc;

use crate::cache::ManifestCache;
use crate::cluster::{ClusterClient, ObjectKey};
use crate::error::{KubeError, Result};
use crate::render::Renderer;

/// Reconciles one installation against a cluster
pub struct Installer {
    pub(crate) cluster: Arc<dyn ClusterClient>,
    pub(crate) cache: Arc<dyn ManifestCache>,
    pub(crate) cache_key: ObjectKey,
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
    pub(crate) manager_name: String,
    pub(crate) manager_uid: String,
}

impl Installer {
    pub fn builder() -> InstallerBuilder {
        InstallerBuilder::default()
    }

    /// Key the installation is cached under
    pub fn cache_key(&self) -> &ObjectKey {
        &self.cache_key
    }

    /// Name of the managing component, also used as field manager
    pub fn manager_name(&self) -> &str {
        &self.manager_name
    }

    pub fn manager_uid(&self) -> &str {
        &self.manager_uid
    }

    pub(crate) fn renderer(&self) -> Result<&dyn Renderer> {
        self.renderer
            .as_deref()
            .ok_or_else(|| KubeError::InvalidConfig("no renderer configured".to_string()))
    }
}

impl fmt::Debug for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installer")
            .field("cache_key", &self.cache_key)
            .field("manager_name", &self.manager_name)
            .field("manager_uid", &self.manager_uid)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Installer`]
#[derive(Default)]
pub struct InstallerBuilder {
    cluster: Option<Arc<dyn ClusterClient>>,
    cache: Option<Arc<dyn ManifestCache>>,
    cache_key: Option<ObjectKey>,
    renderer: Option<Arc<dyn Renderer>>,
    manager_name: Option<String>,
    manager_uid: String,
}

impl InstallerBuilder {
    pub fn cluster(mut self, cluster: Arc<dyn ClusterClient>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn ManifestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Key of the cache entry, usually the namespace and name of the owning object
    pub fn cache_key(mut self, key: ObjectKey) -> Self {
        self.cache_key = Some(key);
        self
    }

    /// Renderer used by install; uninstall and verify do not need one
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn manager_name(mut self, name: impl Into<String>) -> Self {
        self.manager_name = Some(name.into());
        self
    }

    pub fn manager_uid(mut self, uid: impl Into<String>) -> Self {
        self.manager_uid = uid.into();
        self
    }

    pub fn build(self) -> Result<Installer> {
        let cluster = self
            .cluster
            .ok_or_else(|| KubeError::InvalidConfig("cluster client is required".to_string()))?;
        let cache = self
            .cache
            .ok_or_else(|| KubeError::InvalidConfig("manifest cache is required".to_string()))?;
        let cache_key = self
            .cache_key
            .filter(|k| !k.name.is_empty())
            .ok_or_else(|| KubeError::InvalidConfig("cache key name is required".to_string()))?;
        let manager_name = self
            .manager_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| KubeError::InvalidConfig("manager name is required".to_string()))?;

        Ok(Installer {
            cluster,
            cache,
            cache_key,
            renderer: self.renderer,
            manager_name,
            manager_uid: self.manager_uid,
        })
    }
}
