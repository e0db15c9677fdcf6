//! Uninstall: delete everything the cache lists, in up to two waves
//!
//! Uninstall is meant to be called repeatedly until it reports done. Each
//! call proceeds through three phases and stops at the first incomplete one:
//! 1. Delete objects matching the `uninstall_first` predicate
//! 2. Delete all other objects
//! 3. Fire the post-uninstall hooks on every cached object
//!
//! The cache entry is removed only once all three phases are complete, so an
//! interrupted uninstall always resumes from the full object list.

use bosun_core::{Resource, parse_manifest, split_by_predicate};
use tracing::{debug, info};

use crate::actions::UninstallOptions;
use crate::cluster::{ClusterClient, DeletionStatus, ObjectKey};
use crate::error::{KubeError, Result};
use crate::hooks::{SharedPostUninstallHook, fire_all_post_uninstall};
use crate::installer::Installer;

/// Issue a delete for `resource`; returns whether it is gone
///
/// A missing object counts as gone.
pub(crate) async fn delete_object(cluster: &dyn ClusterClient, resource: &Resource) -> Result<bool> {
    match cluster.delete(resource).await {
        Ok(DeletionStatus::Deleted) => Ok(true),
        Ok(DeletionStatus::InProgress) => Ok(false),
        Err(e) if e.is_not_found() => Ok(true),
        Err(e) => Err(KubeError::Delete {
            resource: ObjectKey::of(resource).to_string(),
            source: Box::new(e),
        }),
    }
}

impl Installer {
    /// Delete the cached installation; returns `true` once it is fully removed
    ///
    /// While it returns `false`, call it again later.
    pub async fn uninstall(&self, options: &UninstallOptions) -> Result<bool> {
        let cached = self.cache.get(&self.cache_key).await?;
        let objects = parse_manifest(&cached.manifest)?;
        let (first, rest) = split_by_predicate(objects.clone(), options.uninstall_first.as_ref());

        if !self.delete_objects(&first).await? {
            info!(
                installation = %self.cache_key,
                "waiting for prioritized objects to be removed"
            );
            return Ok(false);
        }

        if !self.delete_objects(&rest).await? {
            info!(installation = %self.cache_key, "waiting for objects to be removed");
            return Ok(false);
        }

        if !fire_post_uninstall(&options.post_uninstall, &objects).await? {
            info!(installation = %self.cache_key, "waiting for post-uninstall hooks");
            return Ok(false);
        }

        self.cache.delete(&self.cache_key).await?;
        info!(installation = %self.cache_key, "uninstall finished");
        Ok(true)
    }

    /// Issue a delete for every object; done only if all are gone
    async fn delete_objects(&self, objects: &[Resource]) -> Result<bool> {
        let mut done = true;
        for object in objects {
            if !delete_object(self.cluster.as_ref(), object).await? {
                debug!(object = %object.key(), "object is terminating");
                done = false;
            }
        }
        Ok(done)
    }
}

/// Run the hooks on every object; done only if every hook is done for every object
async fn fire_post_uninstall(hooks: &[SharedPostUninstallHook], objects: &[Resource]) -> Result<bool> {
    let mut done = true;
    for object in objects {
        done &= fire_all_post_uninstall(hooks, object).await?;
    }
    Ok(done)
}
