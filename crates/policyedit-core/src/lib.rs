//! policyedit Core - types for recording policies on Kubernetes resources
//!
//! This crate provides the foundational types used throughout policyedit:
//! - `ResourceId`: `<namespace>:<kind>/<name>` resource identities
//! - `Policy`: the recognized policies and their annotation keys
//! - `PolicyUpdate`: a set of policies to add and to remove
//! - `TagPattern`: glob, semver and regexp image tag filters
//! - `PolicyConfig`: annotation prefix and namespace defaults

pub mod config;
pub mod error;
pub mod pattern;
pub mod policy;
pub mod resource;

pub use config::PolicyConfig;
pub use error::{CoreError, Result};
pub use pattern::{PATTERN_KINDS, PatternKind, TagPattern, pattern_kind};
pub use policy::{DEFAULT_ANNOTATION_PREFIX, Policy, PolicySet, PolicyUpdate};
pub use resource::{CLUSTER_SCOPE, ResourceId};
