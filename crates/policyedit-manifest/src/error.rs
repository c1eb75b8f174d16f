//! Error types for policyedit-manifest

use miette::Diagnostic;
use policyedit_core::{CoreError, ResourceId};
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors that can occur while reading or rewriting manifests
///
/// None of these are retried; the input is never partially rewritten.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ManifestError {
    /// No document describes the resource
    #[error("resource {resource} not found in manifests")]
    #[diagnostic(
        code(policyedit::manifest::not_found),
        help("check the namespace, kind and name; documents without a namespace use the default namespace")
    )]
    ResourceNotFound { resource: ResourceId },

    /// More than one document describes the resource
    #[error("resource {resource} is defined {count} times in the same manifests")]
    #[diagnostic(
        code(policyedit::manifest::ambiguous),
        help("remove the duplicate definitions so that each resource appears once")
    )]
    AmbiguousResource { resource: ResourceId, count: usize },

    /// `tag_all` was requested for a resource without containers
    #[error("no containers found in {resource} to apply {policy} to")]
    #[diagnostic(
        code(policyedit::manifest::no_containers),
        help("tag_all needs a pod template with at least one container")
    )]
    NoContainersFound { resource: ResourceId, policy: String },

    /// A tag policy value does not parse
    #[error("invalid tag pattern {value:?} for container {container}: {reason}")]
    #[diagnostic(
        code(policyedit::policy::invalid_tag_pattern),
        help("use glob:<pattern>, semver:<range>, regexp:<expression> or a literal tag")
    )]
    InvalidTagPattern {
        container: String,
        value: String,
        reason: String,
    },

    /// A document cannot be read far enough to edit its annotations
    #[error("malformed manifest (document {document}): {message}")]
    #[diagnostic(code(policyedit::manifest::malformed))]
    MalformedManifest { document: usize, message: String },

    /// The namespace of a document could not be determined
    #[error("cannot determine namespace of {kind}/{name}: {message}")]
    #[diagnostic(code(policyedit::manifest::namespace))]
    Namespace {
        kind: String,
        name: String,
        message: String,
    },

    /// An annotation value could not be written as YAML
    #[error("serialization error: {0}")]
    #[diagnostic(code(policyedit::manifest::serialization))]
    Serialization(String),

    /// Error from policyedit-core
    #[error(transparent)]
    #[diagnostic(code(policyedit::core))]
    Core(CoreError),
}

impl From<CoreError> for ManifestError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidTagPattern {
                container,
                value,
                reason,
            } => ManifestError::InvalidTagPattern {
                container,
                value,
                reason,
            },
            other => ManifestError::Core(other),
        }
    }
}

impl From<serde_yaml::Error> for ManifestError {
    fn from(e: serde_yaml::Error) -> Self {
        ManifestError::Serialization(e.to_string())
    }
}

impl ManifestError {
    pub(crate) fn malformed(document: usize, message: impl Into<String>) -> Self {
        ManifestError::MalformedManifest {
            document,
            message: message.into(),
        }
    }

    /// Check if the resource could not be found or was defined twice
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ManifestError::ResourceNotFound { .. } | ManifestError::AmbiguousResource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_lifted_from_core() {
        let core = CoreError::InvalidTagPattern {
            container: "nginx".to_string(),
            value: "regexp:*".to_string(),
            reason: "repetition operator missing expression".to_string(),
        };
        let err = ManifestError::from(core);
        assert!(matches!(err, ManifestError::InvalidTagPattern { .. }));
        insta::assert_snapshot!(
            err.to_string(),
            @r#"invalid tag pattern "regexp:*" for container nginx: repetition operator missing expression"#
        );
    }

    #[test]
    fn test_lookup_failure_messages() {
        let resource: ResourceId = "default:deployment/nginx".parse().unwrap();
        let err = ManifestError::AmbiguousResource {
            resource: resource.clone(),
            count: 2,
        };
        assert!(err.is_lookup_failure());
        insta::assert_snapshot!(
            err.to_string(),
            @"resource default:deployment/nginx is defined 2 times in the same manifests"
        );

        let err = ManifestError::ResourceNotFound { resource };
        assert!(err.is_lookup_failure());
        assert!(!ManifestError::malformed(0, "x").is_lookup_failure());
    }
}
