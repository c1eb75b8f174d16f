//! Resource identities
//!
//! A resource is addressed as `<namespace>:<kind>/<name>`, for example
//! `default:deployment/nginx`. Cluster-scoped resources use the
//! [`CLUSTER_SCOPE`] pseudo-namespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Pseudo-namespace for cluster-scoped resources
pub const CLUSTER_SCOPE: &str = "<cluster>";

/// Identity of a single resource within a set of manifests
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    namespace: String,
    kind: String,
    name: String,
}

impl ResourceId {
    /// Build an id from its parts. The kind is stored lower-cased.
    pub fn new(
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into().to_lowercase(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Lower-cased kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether this id refers to a cluster-scoped resource
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace == CLUSTER_SCOPE
    }

    /// Compare against the fields of a manifest, ignoring the case of the kind
    pub fn matches(&self, namespace: &str, kind: &str, name: &str) -> bool {
        self.namespace == namespace && self.kind.eq_ignore_ascii_case(kind) && self.name == name
    }
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidResourceId {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (namespace, rest) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected <namespace>:<kind>/<name>"))?;
        let (kind, name) = rest
            .split_once('/')
            .ok_or_else(|| invalid("expected <kind>/<name> after the namespace"))?;

        if kind.is_empty() {
            return Err(invalid("kind is empty"));
        }
        if name.is_empty() || name.contains('/') {
            return Err(invalid("name must be a single non-empty segment"));
        }

        Ok(Self::new(namespace, kind, name))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.namespace, self.kind, self.name)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
