//! Policy configuration
//!
//! Loaded from a YAML file such as:
//!
//! ```yaml
//! annotationPrefix: fluxcd.io
//! defaultNamespace: apps
//! clusterScopedKinds:
//!   - Tenant
//! ```
//!
//! Every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::policy::DEFAULT_ANNOTATION_PREFIX;

/// Settings shared by every policy update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Prefix of every policy annotation key, without the trailing `/`
    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,

    /// Namespace assumed for namespaced resources that do not declare one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Kinds that are cluster-scoped, in addition to the built-in ones
    #[serde(default)]
    pub cluster_scoped_kinds: Vec<String>,
}

fn default_annotation_prefix() -> String {
    DEFAULT_ANNOTATION_PREFIX.to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: default_annotation_prefix(),
            default_namespace: default_namespace(),
            cluster_scoped_kinds: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Load configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the annotation prefix, normalizing a trailing `/`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        self.annotation_prefix = prefix.into();
        self.validate()?;
        Ok(self)
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.annotation_prefix.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(CoreError::Config {
                message: format!(
                    "annotation prefix {:?} must be a non-empty key without spaces",
                    self.annotation_prefix
                ),
            });
        }
        self.annotation_prefix = trimmed.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PolicyConfig::default();
        assert_eq!(config.annotation_prefix, "flux.weave.works");
        assert_eq!(config.default_namespace, "default");
        assert!(config.cluster_scoped_kinds.is_empty());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = PolicyConfig::from_yaml("annotationPrefix: fluxcd.io/\n").unwrap();
        assert_eq!(config.annotation_prefix, "fluxcd.io");
        assert_eq!(config.default_namespace, "default");
    }

    #[test]
    fn test_from_yaml_empty() {
        assert_eq!(PolicyConfig::from_yaml("").unwrap(), PolicyConfig::default());
    }

    #[test]
    fn test_rejects_bad_prefix() {
        assert!(PolicyConfig::from_yaml("annotationPrefix: '/'\n").is_err());
        assert!(PolicyConfig::default().with_prefix("flux weave").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "defaultNamespace: apps\nclusterScopedKinds:\n  - Tenant"
        )
        .unwrap();

        let config = PolicyConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_namespace, "apps");
        assert_eq!(config.cluster_scoped_kinds, vec!["Tenant".to_string()]);
    }
}
