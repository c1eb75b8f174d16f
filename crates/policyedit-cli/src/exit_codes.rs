//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Policy error - unknown policy name or invalid tag pattern
pub const POLICY_ERROR: i32 = 2;

/// Lookup error - resource missing from the manifests, or defined twice
pub const LOOKUP_ERROR: i32 = 3;

/// Manifest error - the manifest cannot be read or edited
pub const MANIFEST_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
