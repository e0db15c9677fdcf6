//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - exit code outside the range a process can report
pub const ERROR: i32 = 1;

/// Not ready - verification found the installation still converging
pub const NOT_READY: i32 = 2;

/// Template error - template loading or rendering failed
pub const TEMPLATE_ERROR: i32 = 3;

/// Cluster error - a Kubernetes request or reconcile step failed
pub const CLUSTER_ERROR: i32 = 4;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Interrupted by SIGINT (128 + 2)
pub const INTERRUPTED: i32 = 130;
