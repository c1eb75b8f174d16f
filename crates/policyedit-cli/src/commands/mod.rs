//! CLI commands

pub mod check;
pub mod show;
pub mod update;

use std::path::Path;

use policyedit_core::{PolicyConfig, ResourceId};

use crate::error::{CliError, Result};

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<std::path::PathBuf>,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
}

impl GlobalOptions {
    /// Configuration file values, overridden by flags and environment
    pub fn load_config(&self) -> Result<PolicyConfig> {
        let mut config = match &self.config {
            Some(path) => PolicyConfig::load_from(path)?,
            None => PolicyConfig::default(),
        };
        if let Some(prefix) = &self.prefix {
            config = config.with_prefix(prefix.clone())?;
        }
        if let Some(namespace) = &self.namespace {
            config.default_namespace = namespace.clone();
        }
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }
}

pub(crate) fn parse_resource(resource: &str) -> Result<ResourceId> {
    Ok(resource.parse()?)
}

pub(crate) fn read_manifest(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::Io {
        message: format!("failed to read {}: {e}", path.display()),
    })
}
