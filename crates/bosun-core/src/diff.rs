//! Diff between a previously applied manifest and the current one
//!
//! Resources are compared by identity only (kind, namespace, name). A
//! resource whose content changed but kept its identity is still in use.

use std::collections::HashSet;

use crate::resource::{Resource, ResourceKey};

/// Resources from `previous` whose identity does not appear in `current`
///
/// Order follows `previous`. Duplicate identities are not collapsed.
pub fn unused_objects(previous: &[Resource], current: &[Resource]) -> Vec<Resource> {
    let current_keys: HashSet<ResourceKey> = current.iter().map(Resource::key).collect();

    previous
        .iter()
        .filter(|r| !current_keys.contains(&r.key()))
        .cloned()
        .collect()
}

/// Identities that appear more than once, in first-repeat order
pub fn duplicate_keys(resources: &[Resource]) -> Vec<ResourceKey> {
    let mut seen = HashSet::with_capacity(resources.len());
    let mut duplicates = Vec::new();

    for key in resources.iter().map(Resource::key) {
        if !seen.insert(key.clone()) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }

    duplicates
}
