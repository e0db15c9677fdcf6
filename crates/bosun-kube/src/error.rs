//! Error types for bosun-kube

use thiserror::Error;

/// Result type for bosun-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while reconciling a manifest against a cluster
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object does not exist in the cluster
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// Cluster rejected a request (used by non-API cluster implementations)
    #[error("cluster error: {0}")]
    Cluster(String),

    /// Chart rendering failed
    #[error("could not render manifest from chart: {0}")]
    Render(String),

    /// Rendered or cached manifest could not be parsed
    #[error("could not parse chart manifest: {0}")]
    Manifest(#[from] bosun_core::CoreError),

    /// Server-side apply of one object failed
    #[error("could not install object {resource}: {source}")]
    Apply {
        resource: String,
        #[source]
        source: Box<KubeError>,
    },

    /// Deletion of one object failed
    #[error("could not uninstall object {resource}: {source}")]
    Delete {
        resource: String,
        #[source]
        source: Box<KubeError>,
    },

    /// Live state of a Deployment could not be read
    #[error("could not verify deployment {resource}: {source}")]
    Verify {
        resource: String,
        #[source]
        source: Box<KubeError>,
    },

    /// A caller-supplied hook failed
    #[error("hook failed: {0}")]
    Hook(String),

    /// Manifest cache error
    #[error("manifest cache error: {0}")]
    Cache(String),

    /// The resource type is not served by the cluster
    #[error("unknown resource type: {api_version}/{kind}")]
    UnknownResource { api_version: String, kind: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compression error
    #[error("compression error: {0}")]
    Compression(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a "not found" condition, from any cluster implementation
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    pub(crate) fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        KubeError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}
