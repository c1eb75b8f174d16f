//! Applying policy updates to manifest files

use indexmap::{IndexMap, IndexSet};
use policyedit_core::{Policy, PolicyConfig, PolicySet, PolicyUpdate, ResourceId};
use tracing::{debug, warn};

use crate::annotations::AnnotationEditor;
use crate::containers::discover_containers;
use crate::document::ParsedDocument;
use crate::error::{ManifestError, Result};
use crate::locator::locate_resource;
use crate::namespace::{DefaultNamespacer, Namespacer, ResourceScopes};

/// Policy operations over raw manifest text
///
/// Holds no state between calls; every call works on the buffer it is given.
#[derive(Debug, Clone)]
pub struct Manifests<N> {
    namespacer: N,
    scopes: ResourceScopes,
    prefix: String,
}

impl Manifests<DefaultNamespacer> {
    /// Build from configuration, using [`DefaultNamespacer`] and the stock
    /// Kubernetes scopes plus any configured cluster-scoped kinds
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(DefaultNamespacer::from_config(config))
            .with_scopes(ResourceScopes::kubernetes().with_kinds(&config.cluster_scoped_kinds))
            .with_prefix(config.annotation_prefix.clone())
    }
}

impl<N: Namespacer> Manifests<N> {
    pub fn new(namespacer: N) -> Self {
        Self {
            namespacer,
            scopes: ResourceScopes::kubernetes(),
            prefix: policyedit_core::DEFAULT_ANNOTATION_PREFIX.to_string(),
        }
    }

    pub fn with_scopes(mut self, scopes: ResourceScopes) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Record `update` on the resource `id` in `manifest`.
    ///
    /// Returns the rewritten manifest. Only the annotations of the target
    /// document change; on error nothing is returned, so a failed update
    /// never leaves a half-edited buffer behind.
    pub fn update_policies(
        &self,
        manifest: &str,
        id: &ResourceId,
        update: &PolicyUpdate,
    ) -> Result<String> {
        update.validate()?;

        let doc = self.locate(manifest, id)?;
        let remove = self.resolve(&doc, id, &update.remove)?;
        let add = self.resolve(&doc, id, &update.add)?;

        let remove_keys: Vec<String> = remove.into_keys().collect();
        let add_pairs: Vec<(String, String)> = add
            .into_iter()
            .filter(|(key, _)| {
                let removed = remove_keys.contains(key);
                if removed {
                    warn!(resource = %id, %key, "policy is both added and removed; removing");
                }
                !removed
            })
            .collect();

        debug!(
            resource = %id,
            document = doc.span.index,
            remove = remove_keys.len(),
            add = add_pairs.len(),
            "updating policies"
        );

        let range = doc.span.range.clone();
        let editor = AnnotationEditor::new(&manifest[range.clone()], doc.span.index)?;
        let edited = editor.apply(&remove_keys, &add_pairs)?;

        let mut out = String::with_capacity(manifest.len() + edited.len() - range.len());
        out.push_str(&manifest[..range.start]);
        out.push_str(&edited);
        out.push_str(&manifest[range.end..]);
        Ok(out)
    }

    /// The policies currently recorded on the resource `id`
    pub fn policies(&self, manifest: &str, id: &ResourceId) -> Result<PolicySet> {
        let doc = self.locate(manifest, id)?;
        Ok(doc
            .header
            .annotations()
            .into_iter()
            .filter_map(|(key, value)| {
                Policy::from_annotation_key(&self.prefix, key).map(|p| (p, value))
            })
            .collect())
    }

    /// Container names of the resource `id`
    pub fn containers(&self, manifest: &str, id: &ResourceId) -> Result<Vec<String>> {
        let doc = self.locate(manifest, id)?;
        Ok(discover_containers(&doc.header.kind, &doc.value))
    }

    fn locate(&self, manifest: &str, id: &ResourceId) -> Result<ParsedDocument> {
        locate_resource(manifest, id, &self.namespacer, &self.scopes)
    }

    /// Map policies to annotation keys, expanding `tag_all` over the
    /// containers of the document. Explicit container policies take
    /// precedence over the expansion.
    fn resolve(
        &self,
        doc: &ParsedDocument,
        id: &ResourceId,
        policies: &PolicySet,
    ) -> Result<IndexMap<String, String>> {
        let mut resolved = IndexMap::new();
        let mut explicit = IndexSet::new();

        for (policy, value) in policies {
            match policy {
                Policy::TagAll => {
                    let containers = discover_containers(&doc.header.kind, &doc.value);
                    if containers.is_empty() {
                        return Err(ManifestError::NoContainersFound {
                            resource: id.clone(),
                            policy: policy.to_string(),
                        });
                    }
                    for container in containers {
                        let key = self.key(&Policy::TagPrefix(container));
                        if !explicit.contains(&key) {
                            resolved.insert(key, value.clone());
                        }
                    }
                }
                policy => {
                    let key = self.key(policy);
                    explicit.insert(key.clone());
                    resolved.insert(key, value.clone());
                }
            }
        }

        Ok(resolved)
    }

    fn key(&self, policy: &Policy) -> String {
        policy
            .annotation_key(&self.prefix)
            .unwrap_or_else(|| format!("{}/{}", self.prefix, policy))
    }
}
