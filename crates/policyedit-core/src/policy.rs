//! Policies recorded as resource annotations
//!
//! Every policy maps to one annotation key under a configurable prefix:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     flux.weave.works/automated: 'true'
//!     flux.weave.works/locked: 'true'
//!     flux.weave.works/locked_msg: waiting for QA
//!     flux.weave.works/tag.nginx: semver:~1.14
//! ```
//!
//! [`Policy::TagAll`] has no key of its own; it is expanded to one
//! [`Policy::TagPrefix`] per container when an update is applied.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{CoreError, Result};
use crate::pattern::TagPattern;

/// Annotation prefix used when none is configured
pub const DEFAULT_ANNOTATION_PREFIX: &str = "flux.weave.works";

const AUTOMATED: &str = "automated";
const LOCKED: &str = "locked";
const LOCKED_MSG: &str = "locked_msg";
const TAG_ALL: &str = "tag_all";
const TAG_PREFIX: &str = "tag.";

/// A recognized policy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Policy {
    /// Images are updated automatically
    Automated,
    /// The resource must not be changed by automation
    Locked,
    /// Free-text reason for a lock
    LockedMsg,
    /// Tag filter for one named container
    TagPrefix(String),
    /// Tag filter for every container of the resource
    TagAll,
}

impl Policy {
    /// Tag filter policy for a container
    pub fn tag(container: impl Into<String>) -> Self {
        Self::TagPrefix(container.into())
    }

    /// Whether the value of this policy is a tag pattern
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::TagPrefix(_) | Self::TagAll)
    }

    /// Annotation key for this policy, `None` for [`Policy::TagAll`]
    pub fn annotation_key(&self, prefix: &str) -> Option<String> {
        let suffix = match self {
            Self::Automated => AUTOMATED.to_string(),
            Self::Locked => LOCKED.to_string(),
            Self::LockedMsg => LOCKED_MSG.to_string(),
            Self::TagPrefix(container) => format!("{TAG_PREFIX}{container}"),
            Self::TagAll => return None,
        };
        Some(format!("{prefix}/{suffix}"))
    }

    /// Map an annotation key back to a policy. Keys outside the prefix, or
    /// not naming a known policy, return `None`.
    pub fn from_annotation_key(prefix: &str, key: &str) -> Option<Self> {
        let name = key.strip_prefix(prefix)?.strip_prefix('/')?;
        match name {
            TAG_ALL => None,
            name => name.parse().ok(),
        }
    }

    /// Check a value for this policy. Only tag policies are constrained.
    pub fn validate_value(&self, value: &str) -> Result<()> {
        if !self.is_tag() {
            return Ok(());
        }
        TagPattern::parse(value)
            .map(|_| ())
            .map_err(|reason| CoreError::InvalidTagPattern {
                container: self.container_label(),
                value: value.to_string(),
                reason,
            })
    }

    fn container_label(&self) -> String {
        match self {
            Self::TagPrefix(container) => container.clone(),
            _ => "all containers".to_string(),
        }
    }
}

impl FromStr for Policy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            AUTOMATED => Ok(Self::Automated),
            LOCKED => Ok(Self::Locked),
            LOCKED_MSG => Ok(Self::LockedMsg),
            TAG_ALL => Ok(Self::TagAll),
            s => match s.strip_prefix(TAG_PREFIX) {
                Some(container) if !container.is_empty() => Ok(Self::tag(container)),
                _ => Err(CoreError::UnknownPolicy {
                    name: s.to_string(),
                }),
            },
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automated => f.write_str(AUTOMATED),
            Self::Locked => f.write_str(LOCKED),
            Self::LockedMsg => f.write_str(LOCKED_MSG),
            Self::TagPrefix(container) => write!(f, "{TAG_PREFIX}{container}"),
            Self::TagAll => f.write_str(TAG_ALL),
        }
    }
}

/// Policies with their values, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet(IndexMap<Policy, String>);

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`PolicySet::set`]
    pub fn with(mut self, policy: Policy, value: impl Into<String>) -> Self {
        self.set(policy, value);
        self
    }

    /// Set a policy. An existing policy keeps its position.
    pub fn set(&mut self, policy: Policy, value: impl Into<String>) {
        self.0.insert(policy, value.into());
    }

    pub fn get(&self, policy: &Policy) -> Option<&str> {
        self.0.get(policy).map(String::as_str)
    }

    pub fn contains(&self, policy: &Policy) -> bool {
        self.0.contains_key(policy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Policy, &str)> {
        self.0.iter().map(|(p, v)| (p, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Policy, String)> for PolicySet {
    fn from_iter<I: IntoIterator<Item = (Policy, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = (&'a Policy, &'a String);
    type IntoIter = indexmap::map::Iter<'a, Policy, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Policies to add and to remove in one change
///
/// When a key ends up in both sets, the removal wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyUpdate {
    pub add: PolicySet,
    pub remove: PolicySet,
}

impl PolicyUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, policy: Policy, value: impl Into<String>) -> Self {
        self.add.set(policy, value);
        self
    }

    /// Remove a policy. The value is ignored when applying.
    pub fn remove(mut self, policy: Policy) -> Self {
        self.remove.set(policy, String::new());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Validate the values of every added tag policy.
    ///
    /// Independent of any manifest content.
    pub fn validate(&self) -> Result<()> {
        self.add
            .iter()
            .try_for_each(|(policy, value)| policy.validate_value(value))
    }
}
