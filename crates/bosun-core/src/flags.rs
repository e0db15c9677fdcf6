//! Chart flags built from dotted keys
//!
//! ```
//! use bosun_core::FlagsBuilder;
//!
//! let flags = FlagsBuilder::new()
//!     .with("global.commonLabels.managedBy", "my-manager")
//!     .with("replicas", 3)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(flags["global"]["commonLabels"]["managedBy"], "my-manager");
//! ```

use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// Nested flag map passed to the renderer and stored with the cached manifest
pub type Flags = Map<String, JsonValue>;

/// Collects dotted-key flags and expands them into a nested [`Flags`] map
#[derive(Debug, Clone, Default)]
pub struct FlagsBuilder {
    flags: Vec<(String, JsonValue)>,
}

impl FlagsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag; a later value for the same key replaces the earlier one
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.flags.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.flags.push((key, value)),
        }
        self
    }

    /// Add a flag from `key=value` text, inferring the value type
    pub fn with_set(self, arg: &str) -> Result<Self> {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidFlagKey {
                key: arg.to_string(),
            })?;
        Ok(self.with(key, parse_flag_value(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Expand all flags into a nested map
    pub fn build(&self) -> Result<Flags> {
        let mut flags = Flags::new();
        for (key, value) in &self.flags {
            insert_dotted(&mut flags, key, value.clone())?;
        }
        Ok(flags)
    }
}

/// Infer a JSON value from flag text: booleans, null, numbers, inline JSON, else string
pub fn parse_flag_value(value: &str) -> JsonValue {
    match value {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        "null" => JsonValue::Null,
        _ => {
            if let Ok(num) = value.parse::<i64>() {
                JsonValue::Number(num.into())
            } else if let Some(num) = value
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                JsonValue::Number(num)
            } else if value.starts_with('[') || value.starts_with('{') {
                serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_string()))
            } else {
                JsonValue::String(value.to_string())
            }
        }
    }
}

fn insert_dotted(flags: &mut Flags, key: &str, value: JsonValue) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::InvalidFlagKey {
            key: key.to_string(),
        });
    }

    let conflict = |depth: usize| CoreError::FlagConflict {
        key: key.to_string(),
        path: segments[..=depth].join("."),
    };

    let mut current = flags;
    let last = segments.len() - 1;
    for (depth, segment) in segments.iter().enumerate() {
        if depth == last {
            if current.contains_key(*segment) {
                return Err(conflict(depth));
            }
            current.insert(segment.to_string(), value);
            return Ok(());
        }

        current = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| conflict(depth))?;
    }

    Ok(())
}
