//! Update command - add and remove policies on a resource

use std::path::Path;

use console::style;
use policyedit_core::{Policy, PolicyUpdate};
use policyedit_manifest::Manifests;
use similar::TextDiff;

use super::{GlobalOptions, parse_resource, read_manifest};
use crate::error::{CliError, Result};

/// How to report the rewritten manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Print the whole manifest to stdout
    Print,
    /// Print a unified diff to stdout
    Diff,
    /// Write the manifest back to its file
    InPlace,
}

pub fn run(
    global: &GlobalOptions,
    file: &Path,
    resource: &str,
    add: &[String],
    remove: &[String],
    output: Output,
) -> Result<()> {
    let config = global.load_config()?;
    let id = parse_resource(resource)?;
    let update = build_update(add, remove)?;

    if update.is_empty() {
        return Err(CliError::usage_with_help(
            "nothing to update",
            "pass at least one --add <policy>=<value> or --remove <policy>",
        ));
    }

    let manifest = read_manifest(file)?;
    let updated = Manifests::from_config(&config).update_policies(&manifest, &id, &update)?;

    match output {
        Output::Print => print!("{updated}"),
        Output::Diff => {
            let path = file.display().to_string();
            let diff = TextDiff::from_lines(&manifest, &updated);
            print!("{}", diff.unified_diff().context_radius(3).header(&path, &path));
        }
        Output::InPlace => {
            if updated == manifest {
                eprintln!(
                    "{} {} already up to date",
                    style("✓").green(),
                    style(&id).bold()
                );
            } else {
                std::fs::write(file, &updated).map_err(|e| CliError::Io {
                    message: format!("failed to write {}: {e}", file.display()),
                })?;
                eprintln!(
                    "{} Updated {} in {}",
                    style("✓").green(),
                    style(&id).bold(),
                    file.display()
                );
            }
        }
    }

    Ok(())
}

/// Build an update from `name=value` additions and bare-name removals
pub fn build_update(add: &[String], remove: &[String]) -> Result<PolicyUpdate> {
    let mut update = PolicyUpdate::new();

    for entry in add {
        let (name, value) = entry.split_once('=').ok_or_else(|| {
            CliError::usage_with_help(
                format!("invalid --add value {entry:?}"),
                "use --add <policy>=<value>, e.g. --add tag.nginx=semver:~1.14",
            )
        })?;
        let policy: Policy = name.trim().parse()?;
        update = update.add(policy, value);
    }

    for name in remove {
        let policy: Policy = name.trim().parse()?;
        update = update.remove(policy);
    }

    Ok(update)
}
