//! Process-local manifest cache

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{ContextManifest, ManifestCache};
use crate::cluster::ObjectKey;
use crate::error::Result;

/// In-memory [`ManifestCache`]
///
/// Each entry is a private copy: later changes to the value passed to `set`
/// or returned by `get` never affect what is stored.
#[derive(Debug, Default)]
pub struct InMemoryManifestCache {
    entries: RwLock<HashMap<ObjectKey, Arc<ContextManifest>>>,
}

impl InMemoryManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists under `key`
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

#[async_trait]
impl ManifestCache for InMemoryManifestCache {
    async fn set(&self, key: &ObjectKey, manifest: ContextManifest) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::new(manifest));
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<ContextManifest> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        Ok(entry.map(|m| (*m).clone()).unwrap_or_default())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(text: &str) -> ContextManifest {
        ContextManifest {
            manager_uid: "uid".to_string(),
            manifest: text.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_empty() {
        let cache = InMemoryManifestCache::new();
        let entry = cache.get(&ObjectKey::new("ns", "missing")).await.unwrap();
        assert!(entry.is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryManifestCache::new();
        let key = ObjectKey::new("ns", "a");

        cache.set(&key, manifest("first")).await.unwrap();
        cache.set(&key, manifest("second")).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().manifest, "second");
        assert_eq!(cache.len(), 1);

        cache.delete(&key).await.unwrap();
        assert!(!cache.contains(&key));
        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_are_private_copies() {
        let cache = InMemoryManifestCache::new();
        let key = ObjectKey::new("ns", "a");
        let mut original = manifest("m");
        original.custom_flags.insert("a".to_string(), json!(1));

        cache.set(&key, original.clone()).await.unwrap();
        original.custom_flags.insert("b".to_string(), json!(2));

        let mut fetched = cache.get(&key).await.unwrap();
        assert_eq!(fetched.custom_flags.len(), 1);

        fetched.manifest.push_str("changed");
        assert_eq!(cache.get(&key).await.unwrap().manifest, "m");
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(InMemoryManifestCache::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = ObjectKey::new("ns", format!("obj-{}", i % 4));
                cache.set(&key, manifest(&i.to_string())).await.unwrap();
                cache.get(&key).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 4);
    }
}
