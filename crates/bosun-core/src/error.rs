//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid manifest document {index}: {message}")]
    InvalidManifest { index: usize, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid resource: {message}")]
    InvalidResource { message: String },

    #[error("invalid flag key '{key}'")]
    InvalidFlagKey { key: String },

    #[error("flag '{key}' conflicts with an existing value at '{path}'")]
    FlagConflict { key: String, path: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
