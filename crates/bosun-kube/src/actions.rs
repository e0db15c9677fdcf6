//! Action options for install and uninstall operations

use std::fmt;

use bosun_core::{Flags, Predicate};

use crate::hooks::{SharedPostUninstallHook, SharedPreApplyHook};

/// How install treats failures while removing objects dropped from the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Log the failure, keep going and still record the new manifest
    #[default]
    BestEffort,

    /// Abort install on the first failure; the cache keeps the old manifest
    FailFast,
}

/// Options for install operation
#[derive(Clone, Default)]
pub struct InstallOptions {
    /// Flags passed to the renderer and stored with the cached manifest
    pub custom_flags: Flags,

    /// Hooks run on every object before it is applied
    pub pre_apply: Vec<SharedPreApplyHook>,

    /// Handling of failures while removing unused objects
    pub cleanup: CleanupPolicy,
}

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chart flags
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.custom_flags = flags;
        self
    }

    /// Append a pre-apply hook
    pub fn with_pre_apply(mut self, hook: SharedPreApplyHook) -> Self {
        self.pre_apply.push(hook);
        self
    }

    /// Set the cleanup policy
    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }
}

impl fmt::Debug for InstallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallOptions")
            .field("custom_flags", &self.custom_flags)
            .field("pre_apply", &self.pre_apply.len())
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

/// Options for uninstall operation
#[derive(Clone, Default)]
pub struct UninstallOptions {
    /// Objects deleted, and confirmed gone, before any other object is touched
    pub uninstall_first: Option<Predicate>,

    /// Hooks run on every object once it is gone
    pub post_uninstall: Vec<SharedPostUninstallHook>,
}

impl UninstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete objects matching `predicate` first
    pub fn with_uninstall_first(mut self, predicate: Predicate) -> Self {
        self.uninstall_first = Some(predicate);
        self
    }

    /// Append a post-uninstall hook
    pub fn with_post_uninstall(mut self, hook: SharedPostUninstallHook) -> Self {
        self.post_uninstall.push(hook);
        self
    }
}

impl fmt::Debug for UninstallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UninstallOptions")
            .field("uninstall_first", &self.uninstall_first)
            .field("post_uninstall", &self.post_uninstall.len())
            .finish()
    }
}
