//! Exit codes for CLI operations
//!
//! These follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Reconciliation finished with component failures
pub const RECONCILE_ERROR: i32 = 3;

/// A template deletion would be refused
pub const DENIED: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Cluster unreachable or API request failed (sysexits EX_UNAVAILABLE)
pub const UNAVAILABLE: i32 = 69;

/// Invalid configuration file (sysexits EX_CONFIG)
pub const CONFIG_ERROR: i32 = 78;
