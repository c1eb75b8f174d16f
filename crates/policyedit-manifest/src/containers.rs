//! Container discovery in pod templates

use indexmap::IndexSet;
use serde_yaml::Value;

/// Path from the document root to the pod spec for a kind
fn pod_spec_path(kind: &str) -> &'static [&'static str] {
    match kind {
        "Pod" => &["spec"],
        "CronJob" => &["spec", "jobTemplate", "spec", "template", "spec"],
        _ => &["spec", "template", "spec"],
    }
}

/// Names of the containers declared by a resource, primary containers first
/// and then init containers, without duplicates.
pub fn discover_containers(kind: &str, resource: &Value) -> Vec<String> {
    let Some(pod_spec) = pod_spec_path(kind)
        .iter()
        .try_fold(resource, |node, key| node.get(*key))
    else {
        return Vec::new();
    };

    let mut names = IndexSet::new();
    for list in ["containers", "initContainers"] {
        let Some(containers) = pod_spec.get(list).and_then(Value::as_sequence) else {
            continue;
        };
        names.extend(
            containers
                .iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str))
                .map(str::to_string),
        );
    }

    names.into_iter().collect()
}
