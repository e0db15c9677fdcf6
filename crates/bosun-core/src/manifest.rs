//! Multi-document manifest parsing
//!
//! A manifest is the concatenated text of every rendered resource, separated
//! by YAML document markers. Parsing preserves document order, which is the
//! order resources are applied in.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::resource::Resource;

/// Separator placed between documents by [`join_manifest`]
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Parse manifest text into an ordered list of resources
///
/// Empty and comment-only documents are skipped. Any other document must be a
/// mapping with a non-empty `kind`; the first malformed document fails the
/// whole parse.
pub fn parse_manifest(manifest: &str) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(manifest).enumerate() {
        let value = JsonValue::deserialize(document).map_err(|e| CoreError::InvalidManifest {
            index,
            message: e.to_string(),
        })?;

        if value.is_null() {
            continue;
        }

        let resource = Resource::from_value(value).map_err(|e| CoreError::InvalidManifest {
            index,
            message: e.to_string(),
        })?;

        if resource.kind().is_empty() {
            return Err(CoreError::InvalidManifest {
                index,
                message: "Object 'kind' is missing".to_string(),
            });
        }

        resources.push(resource);
    }

    Ok(resources)
}

/// Render resources back into a single manifest
pub fn join_manifest(resources: &[Resource]) -> Result<String> {
    let documents = resources
        .iter()
        .map(Resource::to_yaml)
        .collect::<Result<Vec<_>>>()?;
    Ok(documents.join(DOCUMENT_SEPARATOR))
}
