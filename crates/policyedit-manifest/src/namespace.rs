//! Effective namespaces for documents that do not declare one

use std::collections::BTreeSet;

use policyedit_core::{CLUSTER_SCOPE, PolicyConfig};

use crate::document::ResourceHeader;
use crate::error::{ManifestError, Result};

/// Kinds that are cluster-scoped in a stock Kubernetes cluster
pub const KUBERNETES_CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "CSIDriver",
    "CSINode",
    "CertificateSigningRequest",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PodSecurityPolicy",
    "PriorityClass",
    "RuntimeClass",
    "StorageClass",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

/// Which kinds are cluster-scoped
#[derive(Debug, Clone, Default)]
pub struct ResourceScopes {
    cluster_scoped: BTreeSet<String>,
}

impl ResourceScopes {
    /// No cluster-scoped kinds at all
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock Kubernetes cluster-scoped kinds
    pub fn kubernetes() -> Self {
        Self::new().with_kinds(KUBERNETES_CLUSTER_SCOPED_KINDS.iter().copied())
    }

    /// Mark more kinds as cluster-scoped
    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cluster_scoped
            .extend(kinds.into_iter().map(|k| k.as_ref().to_lowercase()));
        self
    }

    pub fn is_cluster_scoped(&self, kind: &str) -> bool {
        self.cluster_scoped.contains(&kind.to_lowercase())
    }
}

/// Resolves the namespace of a document that has no `metadata.namespace`
pub trait Namespacer {
    fn effective_namespace(&self, resource: &ResourceHeader, scopes: &ResourceScopes)
    -> Result<String>;
}

/// Always answers with the same namespace
#[derive(Debug, Clone)]
pub struct ConstNamespacer(pub String);

impl ConstNamespacer {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }
}

impl Namespacer for ConstNamespacer {
    fn effective_namespace(&self, _: &ResourceHeader, _: &ResourceScopes) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Uses [`CLUSTER_SCOPE`] for cluster-scoped kinds and a fallback
/// namespace for everything else
#[derive(Debug, Clone)]
pub struct DefaultNamespacer {
    pub default_namespace: String,
}

impl DefaultNamespacer {
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.default_namespace.clone())
    }
}

impl Namespacer for DefaultNamespacer {
    fn effective_namespace(
        &self,
        resource: &ResourceHeader,
        scopes: &ResourceScopes,
    ) -> Result<String> {
        if scopes.is_cluster_scoped(&resource.kind) {
            Ok(CLUSTER_SCOPE.to_string())
        } else if self.default_namespace.trim().is_empty() {
            Err(ManifestError::Namespace {
                kind: resource.kind.clone(),
                name: resource.name().to_string(),
                message: "no namespace declared and no default namespace configured".to_string(),
            })
        } else {
            Ok(self.default_namespace.clone())
        }
    }
}

impl<N: Namespacer + ?Sized> Namespacer for &N {
    fn effective_namespace(
        &self,
        resource: &ResourceHeader,
        scopes: &ResourceScopes,
    ) -> Result<String> {
        (**self).effective_namespace(resource, scopes)
    }
}

impl<N: Namespacer + ?Sized> Namespacer for Box<N> {
    fn effective_namespace(
        &self,
        resource: &ResourceHeader,
        scopes: &ResourceScopes,
    ) -> Result<String> {
        (**self).effective_namespace(resource, scopes)
    }
}
