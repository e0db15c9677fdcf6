//! Bosun Core - Building blocks for reconciling rendered manifests
//!
//! This crate provides the pure, synchronous pieces used by the
//! reconciliation core:
//! - `Resource`: An untyped Kubernetes object and its identity
//! - `manifest`: Multi-document manifest parsing
//! - `predicate`: Composable resource filters
//! - `diff`: Objects dropped between two manifests
//! - `annotation`: The "do not edit" disclaimer
//! - `flags`: Dotted-key chart flags

pub mod annotation;
pub mod diff;
pub mod error;
pub mod flags;
pub mod manifest;
pub mod predicate;
pub mod resource;

pub use annotation::add_do_not_edit_disclaimer;
pub use diff::{duplicate_keys, unused_objects};
pub use error::{CoreError, Result};
pub use flags::{Flags, FlagsBuilder, parse_flag_value};
pub use manifest::{join_manifest, parse_manifest};
pub use predicate::{Predicate, split_by_predicate};
pub use resource::{Resource, ResourceKey};
