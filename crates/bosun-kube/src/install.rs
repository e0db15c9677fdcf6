//! Install: render, apply, remove what the manifest no longer contains
//!
//! One call converges the cluster towards the freshly rendered manifest:
//! 1. Read the previously applied manifest from the cache
//! 2. Render the chart with the caller's flags
//! 3. Apply every rendered object in manifest order, after the disclaimer
//!    annotation and the pre-apply hooks
//! 4. Delete objects that were cached but are no longer rendered
//! 5. Record the rendered manifest in the cache
//!
//! Install is idempotent: running it twice with the same inputs reapplies
//! the same objects and deletes nothing. A failure before step 5 leaves the
//! previous cache entry untouched, so the next run retries the same diff.

use bosun_core::{
    Resource, ResourceKey, add_do_not_edit_disclaimer, duplicate_keys, parse_manifest,
    unused_objects,
};
use tracing::{debug, info, warn};

use crate::actions::{CleanupPolicy, InstallOptions};
use crate::cache::ContextManifest;
use crate::cluster::ObjectKey;
use crate::error::{KubeError, Result};
use crate::hooks::{SharedPreApplyHook, fire_all_pre_apply};
use crate::installer::Installer;
use crate::uninstall::delete_object;

/// What one install did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Objects applied, in manifest order
    pub applied: Vec<ResourceKey>,
    /// Unused objects that are gone
    pub removed: Vec<ResourceKey>,
    /// Unused objects whose deletion is still in progress
    pub removal_pending: Vec<ResourceKey>,
    /// Unused objects that could not be deleted, with the error
    pub removal_failed: Vec<(ResourceKey, String)>,
}

impl InstallSummary {
    /// Whether every unused object was removed
    pub fn is_clean(&self) -> bool {
        self.removal_pending.is_empty() && self.removal_failed.is_empty()
    }

    /// Format as human-readable summary
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} applied", self.applied.len())];
        if !self.removed.is_empty() {
            parts.push(format!("{} removed", self.removed.len()));
        }
        if !self.removal_pending.is_empty() {
            parts.push(format!("{} pending removal", self.removal_pending.len()));
        }
        if !self.removal_failed.is_empty() {
            parts.push(format!("{} failed to remove", self.removal_failed.len()));
        }
        parts.join(", ")
    }
}

/// Objects to apply, and cached objects that are no longer rendered
fn objects_to_install_and_remove(
    cached_manifest: &str,
    rendered_manifest: &str,
) -> Result<(Vec<Resource>, Vec<Resource>)> {
    let current = parse_manifest(rendered_manifest)?;
    let previous = parse_manifest(cached_manifest)?;
    let unused = unused_objects(&previous, &current);
    Ok((current, unused))
}

impl Installer {
    /// Bring the cluster in line with the chart rendered from `options.custom_flags`
    pub async fn install(&self, options: &InstallOptions) -> Result<InstallSummary> {
        let renderer = self.renderer()?;
        let cached = self.cache.get(&self.cache_key).await?;
        let rendered = renderer.render(&options.custom_flags)?;

        let (objects, unused) = objects_to_install_and_remove(&cached.manifest, &rendered)?;
        for key in duplicate_keys(&objects) {
            warn!(object = %key, "object appears more than once in the manifest, last one wins");
        }

        let mut summary = InstallSummary::default();
        self.apply_objects(objects, &options.pre_apply, &mut summary)
            .await?;
        self.remove_unused(&unused, options.cleanup, &mut summary)
            .await?;

        self.cache
            .set(
                &self.cache_key,
                ContextManifest {
                    manager_uid: self.manager_uid.clone(),
                    custom_flags: options.custom_flags.clone(),
                    manifest: rendered,
                },
            )
            .await?;

        info!(
            installation = %self.cache_key,
            manager = %self.manager_name,
            summary = %summary.summary(),
            "install finished"
        );
        Ok(summary)
    }

    async fn apply_objects(
        &self,
        objects: Vec<Resource>,
        hooks: &[SharedPreApplyHook],
        summary: &mut InstallSummary,
    ) -> Result<()> {
        for mut object in objects {
            add_do_not_edit_disclaimer(&self.manager_name, &mut object);
            fire_all_pre_apply(hooks, &mut object).await?;

            self.cluster
                .apply(&object, &self.manager_name)
                .await
                .map_err(|e| KubeError::Apply {
                    resource: ObjectKey::of(&object).to_string(),
                    source: Box::new(e),
                })?;

            debug!(kind = object.kind(), namespace = object.namespace(), name = object.name(), "applied");
            summary.applied.push(object.key());
        }
        Ok(())
    }

    async fn remove_unused(
        &self,
        unused: &[Resource],
        cleanup: CleanupPolicy,
        summary: &mut InstallSummary,
    ) -> Result<()> {
        for object in unused {
            match delete_object(self.cluster.as_ref(), object).await {
                Ok(true) => {
                    debug!(object = %object.key(), "removed unused object");
                    summary.removed.push(object.key());
                }
                Ok(false) => {
                    debug!(object = %object.key(), "unused object is terminating");
                    summary.removal_pending.push(object.key());
                }
                Err(e) if cleanup == CleanupPolicy::BestEffort => {
                    warn!(object = %object.key(), error = %e, "could not remove unused object");
                    summary.removal_failed.push((object.key(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
