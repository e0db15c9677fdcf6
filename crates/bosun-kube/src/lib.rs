//! Bosun Kube - Reconciling rendered charts against a Kubernetes cluster
//!
//! This crate provides:
//! - **Installer**: Install, uninstall and verify one chart installation
//! - **Manifest Cache**: Remember what was applied, in memory or in Secrets
//! - **Hooks**: Pre-apply and post-uninstall hooks, optionally filtered by predicate
//! - **Readiness**: Deployment readiness from live status conditions
//! - **Cluster Access**: A narrow client trait with live and in-memory implementations
//!
//! Every operation is a single convergence step. Callers run them from their
//! own reconcile loop and call again until the installation converges.
//! Calls for the same cache key must not overlap; the installer does not
//! serialize them.
//! Dropping an operation's future cancels it; the cache is only written at
//! the end, so a cancelled run is retried in full on the next call.

pub mod actions;
pub mod cache;
pub mod cluster;
pub mod error;
pub mod hooks;
pub mod install;
pub mod installer;
pub mod readiness;
pub mod render;
pub mod uninstall;
pub mod verify;

pub use actions::{CleanupPolicy, InstallOptions, UninstallOptions};
pub use cache::{
    CompressionMethod, ContextManifest, InMemoryManifestCache, ManifestCache, SecretCacheConfig,
    SecretManifestCache,
};
pub use cluster::{
    ClusterClient, DeletionStatus, KubeCluster, MockCluster, ObjectKey, OperationCounts,
};
pub use error::{KubeError, Result};
pub use hooks::{
    PostUninstallHook, PreApplyHook, SharedPostUninstallHook, SharedPreApplyHook,
    fire_all_post_uninstall, fire_all_pre_apply, post_uninstall_hook,
    post_uninstall_with_predicate, pre_apply_hook, pre_apply_with_predicate,
};
pub use install::InstallSummary;
pub use installer::{Installer, InstallerBuilder};
pub use readiness::is_deployment_ready;
pub use render::{Renderer, StaticRenderer};
pub use verify::{DEPLOYMENT_VERIFICATION_PROCESSING, VERIFICATION_COMPLETED, VerificationResult};
