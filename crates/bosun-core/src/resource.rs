//! Resource records parsed from a rendered manifest
//!
//! A [`Resource`] is an untyped Kubernetes object (the equivalent of an
//! "unstructured" object): a JSON mapping with typed accessors for the
//! fields Bosun needs. Two resources are the same object when their
//! [`ResourceKey`] (kind, namespace, name) is equal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, Result};

/// Identity of a resource within a manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// An untyped Kubernetes object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(JsonValue);

impl Default for Resource {
    fn default() -> Self {
        Self(JsonValue::Object(Map::new()))
    }
}

impl Resource {
    /// Create a resource with apiVersion, kind and metadata.name set
    pub fn new(api_version: &str, kind: &str, name: &str) -> Self {
        let mut resource = Self::default();
        resource.set_str(&["apiVersion"], api_version);
        resource.set_str(&["kind"], kind);
        resource.set_str(&["metadata", "name"], name);
        resource
    }

    /// Wrap a JSON value; it must be a mapping
    pub fn from_value(value: JsonValue) -> Result<Self> {
        if !value.is_object() {
            return Err(CoreError::InvalidResource {
                message: "resource must be a mapping".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Parse a single YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.set_namespace(namespace);
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.set_str(&["metadata", "labels", key], value);
        self
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.set_annotation(key, value);
        self
    }

    /// Set an arbitrary field by path, creating intermediate mappings
    pub fn with_field(mut self, path: &[&str], value: JsonValue) -> Self {
        self.set_field(path, value);
        self
    }

    pub fn api_version(&self) -> &str {
        self.str_at(&["apiVersion"])
    }

    pub fn kind(&self) -> &str {
        self.str_at(&["kind"])
    }

    pub fn name(&self) -> &str {
        self.str_at(&["metadata", "name"])
    }

    /// Namespace, empty for cluster-scoped or unset
    pub fn namespace(&self) -> &str {
        self.str_at(&["metadata", "namespace"])
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        self.set_str(&["metadata", "namespace"], namespace);
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind(), self.namespace(), self.name())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.string_map_at(&["metadata", "labels"])
            .and_then(|labels| labels.get(key))
            .and_then(JsonValue::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.string_map_at(&["metadata", "annotations"])
            .and_then(|annotations| annotations.get(key))
            .and_then(JsonValue::as_str)
    }

    /// All string-valued labels
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.collect_strings(&["metadata", "labels"])
    }

    /// All string-valued annotations
    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.collect_strings(&["metadata", "annotations"])
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) {
        self.set_str(&["metadata", "annotations", key], value);
    }

    /// Look up a nested field
    pub fn field(&self, path: &[&str]) -> Option<&JsonValue> {
        path.iter()
            .try_fold(&self.0, |value, segment| value.as_object()?.get(*segment))
    }

    pub fn set_field(&mut self, path: &[&str], value: JsonValue) {
        if !path.is_empty() {
            set_nested(&mut self.0, path, value);
        }
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        self.0
    }

    /// Render back to a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    fn str_at(&self, path: &[&str]) -> &str {
        self.field(path).and_then(JsonValue::as_str).unwrap_or("")
    }

    fn set_str(&mut self, path: &[&str], value: &str) {
        self.set_field(path, JsonValue::String(value.to_string()));
    }

    fn string_map_at(&self, path: &[&str]) -> Option<&Map<String, JsonValue>> {
        self.field(path).and_then(JsonValue::as_object)
    }

    fn collect_strings(&self, path: &[&str]) -> BTreeMap<String, String> {
        self.string_map_at(path)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Set a nested value by path, replacing non-mapping parents
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(Map::new());
    }

    if let JsonValue::Object(map) = value {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

impl TryFrom<JsonValue> for Resource {
    type Error = CoreError;

    fn try_from(value: JsonValue) -> Result<Self> {
        Self::from_value(value)
    }
}
