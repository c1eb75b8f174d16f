//! Show command - display the policies of a resource

use std::path::Path;

use console::style;
use policyedit_manifest::Manifests;

use super::{GlobalOptions, parse_resource, read_manifest};
use crate::error::Result;

pub fn run(global: &GlobalOptions, file: &Path, resource: &str, json_output: bool) -> Result<()> {
    let config = global.load_config()?;
    let id = parse_resource(resource)?;
    let manifest = read_manifest(file)?;

    let manifests = Manifests::from_config(&config);
    let policies = manifests.policies(&manifest, &id)?;
    let containers = manifests.containers(&manifest, &id)?;

    if json_output {
        let policies: serde_json::Map<String, serde_json::Value> = policies
            .iter()
            .map(|(policy, value)| (policy.to_string(), serde_json::Value::from(value)))
            .collect();
        let result = serde_json::json!({
            "resource": id.to_string(),
            "prefix": manifests.prefix(),
            "policies": policies,
            "containers": containers,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&result).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{}", style(&id).cyan().bold());
    println!("{}", style("=".repeat(id.to_string().len())).dim());
    println!();

    if policies.is_empty() {
        println!("{}", style("No policies").dim());
    } else {
        println!("{}:", style("Policies").bold());
        for (policy, value) in &policies {
            println!("  {}: {}", policy, value);
        }
    }

    if !containers.is_empty() {
        println!();
        println!("{}: {}", style("Containers").bold(), containers.join(", "));
    }

    Ok(())
}
