//! End-to-end policy updates against a Deployment manifest

use policyedit_core::{Policy, PolicyUpdate, ResourceId};
use policyedit_manifest::{ConstNamespacer, ManifestError, Manifests};

/// Render the nginx Deployment with the given annotations
fn manifest(annotations: &[(&str, &str)]) -> String {
    let mut out = String::from(
        "---
apiVersion: extensions/v1beta1
kind: Deployment
metadata: # comment really close to the war zone
  name: nginx",
    );
    if !annotations.is_empty() {
        out.push_str("\n  annotations:");
        for (key, value) in annotations {
            out.push_str(&format!("\n    {key}: {value}"));
        }
    }
    out.push_str(
        "
spec:
  replicas: 1
  template:
    metadata: # comment2
      labels:
        name: nginx
    spec:
      containers:
      - image: nginx  # These keys are purposefully un-sorted.
        name: nginx   # And these comments are testing comments.
        ports:
        - containerPort: 80
",
    );
    out
}

fn manifests() -> Manifests<ConstNamespacer> {
    Manifests::new(ConstNamespacer::new("default"))
}

fn nginx() -> ResourceId {
    "default:deployment/nginx".parse().unwrap()
}

struct Case {
    name: &'static str,
    input: &'static [(&'static str, &'static str)],
    output: &'static [(&'static str, &'static str)],
    update: PolicyUpdate,
}

fn check(case: Case) {
    let input = manifest(case.input);
    let expected = manifest(case.output);
    let out = manifests()
        .update_policies(&input, &nginx(), &case.update)
        .unwrap_or_else(|e| panic!("{}: unexpected error: {e}", case.name));
    assert_eq!(out, expected, "{}", case.name);
}

#[test]
fn test_adding_annotation_with_others_existing() {
    check(Case {
        name: "adding annotation with others existing",
        input: &[("prometheus.io.scrape", "'false'")],
        output: &[
            ("prometheus.io.scrape", "'false'"),
            ("flux.weave.works/automated", "'true'"),
        ],
        update: PolicyUpdate::new().add(Policy::Automated, "true"),
    });
}

#[test]
fn test_adding_annotation_when_already_present() {
    check(Case {
        name: "adding annotation when already has annotation",
        input: &[("flux.weave.works/automated", "'true'")],
        output: &[("flux.weave.works/automated", "'true'")],
        update: PolicyUpdate::new().add(Policy::Automated, "true"),
    });
    check(Case {
        name: "adding annotation when already has annotation and others",
        input: &[
            ("flux.weave.works/automated", "'true'"),
            ("prometheus.io.scrape", "'false'"),
        ],
        output: &[
            ("flux.weave.works/automated", "'true'"),
            ("prometheus.io.scrape", "'false'"),
        ],
        update: PolicyUpdate::new().add(Policy::Automated, "true"),
    });
}

#[test]
fn test_adding_first_annotation() {
    check(Case {
        name: "adding first annotation",
        input: &[],
        output: &[("flux.weave.works/automated", "'true'")],
        update: PolicyUpdate::new().add(Policy::Automated, "true"),
    });
}

#[test]
fn test_add_and_remove_different_annotations() {
    check(Case {
        name: "add and remove different annotations at the same time",
        input: &[
            ("flux.weave.works/automated", "'true'"),
            ("prometheus.io.scrape", "'false'"),
        ],
        output: &[
            ("prometheus.io.scrape", "'false'"),
            ("flux.weave.works/locked", "'true'"),
        ],
        update: PolicyUpdate::new()
            .add(Policy::Locked, "true")
            .remove(Policy::Automated),
    });
}

#[test]
fn test_remove_overrides_add_for_same_key() {
    check(Case {
        name: "remove overrides add for same key",
        input: &[],
        output: &[],
        update: PolicyUpdate::new()
            .add(Policy::Locked, "true")
            .remove(Policy::Locked),
    });
    check(Case {
        name: "remove overrides add with existing annotations",
        input: &[("prometheus.io.scrape", "'false'")],
        output: &[("prometheus.io.scrape", "'false'")],
        update: PolicyUpdate::new()
            .add(Policy::Locked, "true")
            .remove(Policy::Locked),
    });
}

#[test]
fn test_remove_annotations() {
    check(Case {
        name: "remove annotation with others existing",
        input: &[
            ("flux.weave.works/automated", "true"),
            ("prometheus.io.scrape", "false"),
        ],
        output: &[("prometheus.io.scrape", "false")],
        update: PolicyUpdate::new().remove(Policy::Automated),
    });
    check(Case {
        name: "remove last annotation",
        input: &[("flux.weave.works/automated", "true")],
        output: &[],
        update: PolicyUpdate::new().remove(Policy::Automated),
    });
    check(Case {
        name: "remove annotation with no annotations",
        input: &[],
        output: &[],
        update: PolicyUpdate::new().remove(Policy::Automated),
    });
    check(Case {
        name: "remove annotation with only others",
        input: &[("prometheus.io.scrape", "false")],
        output: &[("prometheus.io.scrape", "false")],
        update: PolicyUpdate::new().remove(Policy::Automated),
    });
}

#[test]
fn test_remove_multiline_values() {
    check(Case {
        name: "multiline",
        input: &[(
            "flux.weave.works/locked_msg",
            "|-\n      first\n      second",
        )],
        output: &[],
        update: PolicyUpdate::new().remove(Policy::LockedMsg),
    });
    check(Case {
        name: "multiline with empty line",
        input: &[(
            "flux.weave.works/locked_msg",
            "|-\n      first\n\n      third",
        )],
        output: &[],
        update: PolicyUpdate::new().remove(Policy::LockedMsg),
    });
}

#[test]
fn test_add_tag_policies() {
    for value in ["glob:*", "foo", "semver:*", "regexp:(.*?)"] {
        check(Case {
            name: "add tag policy",
            input: &[],
            output: match value {
                "glob:*" => &[("flux.weave.works/tag.nginx", "glob:*")],
                "foo" => &[("flux.weave.works/tag.nginx", "foo")],
                "semver:*" => &[("flux.weave.works/tag.nginx", "semver:*")],
                _ => &[("flux.weave.works/tag.nginx", "regexp:(.*?)")],
            },
            update: PolicyUpdate::new().add(Policy::tag("nginx"), value),
        });
    }
}

#[test]
fn test_invalid_tag_policies_fail() {
    for value in ["semver:invalid", "regexp:*"] {
        let update = PolicyUpdate::new().add(Policy::tag("nginx"), value);
        let err = manifests()
            .update_policies(&manifest(&[]), &nginx(), &update)
            .unwrap_err();
        assert!(
            matches!(err, ManifestError::InvalidTagPattern { .. }),
            "{value}: {err}"
        );
    }
}

#[test]
fn test_invalid_tag_pattern_without_manifest() {
    let update = PolicyUpdate::new().add(Policy::tag("nginx"), "semver:invalid");
    let err = manifests().update_policies("", &nginx(), &update).unwrap_err();
    match err {
        ManifestError::InvalidTagPattern {
            container, value, ..
        } => {
            assert_eq!(container, "nginx");
            assert_eq!(value, "semver:invalid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_set_tag_to_all_containers() {
    check(Case {
        name: "set tag to all containers",
        input: &[],
        output: &[("flux.weave.works/tag.nginx", "semver:*")],
        update: PolicyUpdate::new().add(Policy::TagAll, "semver:*"),
    });
}

#[test]
fn test_tag_all_without_containers() {
    let buf = "apiVersion: v1\nkind: Service\nmetadata:\n  name: nginx\n  namespace: default\n";
    let id: ResourceId = "default:service/nginx".parse().unwrap();
    let update = PolicyUpdate::new().add(Policy::TagAll, "glob:*");
    let err = manifests().update_policies(buf, &id, &update).unwrap_err();
    assert!(matches!(err, ManifestError::NoContainersFound { .. }));
}

#[test]
fn test_overwrite_on_different_value() {
    check(Case {
        name: "overwrite existing value",
        input: &[
            ("flux.weave.works/tag.nginx", "glob:1.*"),
            ("prometheus.io.scrape", "'false'"),
        ],
        output: &[
            ("flux.weave.works/tag.nginx", "semver:~1.14"),
            ("prometheus.io.scrape", "'false'"),
        ],
        update: PolicyUpdate::new().add(Policy::tag("nginx"), "semver:~1.14"),
    });
}

#[test]
fn test_new_keys_follow_declared_order() {
    check(Case {
        name: "ordering",
        input: &[("prometheus.io.scrape", "'false'")],
        output: &[
            ("prometheus.io.scrape", "'false'"),
            ("flux.weave.works/locked", "'true'"),
            ("flux.weave.works/locked_msg", "do not touch"),
            ("flux.weave.works/automated", "'false'"),
        ],
        update: PolicyUpdate::new()
            .add(Policy::Locked, "true")
            .add(Policy::LockedMsg, "do not touch")
            .add(Policy::Automated, "false"),
    });
}

#[test]
fn test_add_is_idempotent() {
    let update = PolicyUpdate::new()
        .add(Policy::Automated, "true")
        .add(Policy::tag("nginx"), "glob:*");
    let once = manifests()
        .update_policies(&manifest(&[]), &nginx(), &update)
        .unwrap();
    let twice = manifests().update_policies(&once, &nginx(), &update).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_add_then_remove_restores_input() {
    let input = manifest(&[]);
    let add = PolicyUpdate::new().add(Policy::Locked, "true");
    let added = manifests().update_policies(&input, &nginx(), &add).unwrap();
    let remove = PolicyUpdate::new().remove(Policy::Locked);
    let removed = manifests().update_policies(&added, &nginx(), &remove).unwrap();
    assert_eq!(removed, input);
}

#[test]
fn test_other_documents_untouched() {
    let other = "\
# the service in front of nginx
apiVersion: v1
kind: Service
metadata:
  name: nginx
  annotations:
    flux.weave.works/automated: 'false' # keep
spec:
  ports:
  - port: 80
";
    let input = format!("{other}{}", manifest(&[]));
    let update = PolicyUpdate::new()
        .add(Policy::Automated, "true")
        .remove(Policy::Locked);
    let out = manifests().update_policies(&input, &nginx(), &update).unwrap();
    assert_eq!(
        out,
        format!(
            "{other}{}",
            manifest(&[("flux.weave.works/automated", "'true'")])
        )
    );
}

#[test]
fn test_resource_lookup_errors() {
    let update = PolicyUpdate::new().add(Policy::Automated, "true");

    let missing: ResourceId = "default:deployment/redis".parse().unwrap();
    let err = manifests()
        .update_policies(&manifest(&[]), &missing, &update)
        .unwrap_err();
    assert!(matches!(err, ManifestError::ResourceNotFound { .. }));

    let twice = format!("{}{}", manifest(&[]), manifest(&[]));
    let err = manifests()
        .update_policies(&twice, &nginx(), &update)
        .unwrap_err();
    assert!(matches!(err, ManifestError::AmbiguousResource { count: 2, .. }));
}

#[test]
fn test_overwrite_null_value_with_comment() {
    let input = manifest(&[("flux.weave.works/tag.nginx", "# pending")]);
    let update = PolicyUpdate::new().add(Policy::tag("nginx"), "glob:*");
    let out = manifests().update_policies(&input, &nginx(), &update).unwrap();
    assert_eq!(out, manifest(&[("flux.weave.works/tag.nginx", "glob:* # pending")]));

    let policies = manifests().policies(&out, &nginx()).unwrap();
    assert_eq!(policies.get(&Policy::tag("nginx")), Some("glob:*"));
}

#[test]
fn test_crlf_manifest_keeps_line_endings() {
    let input = manifest(&[("prometheus.io.scrape", "'false'")]).replace('\n', "\r\n");
    let update = PolicyUpdate::new().add(Policy::Automated, "true");
    let out = manifests().update_policies(&input, &nginx(), &update).unwrap();
    assert_eq!(
        out,
        manifest(&[
            ("prometheus.io.scrape", "'false'"),
            ("flux.weave.works/automated", "'true'"),
        ])
        .replace('\n', "\r\n")
    );
}

#[test]
fn test_unrelated_numeric_name_does_not_fail() {
    let other = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: 2024\ndata: {}\n";
    let input = format!("{other}{}", manifest(&[]));
    let update = PolicyUpdate::new().add(Policy::Automated, "true");
    let out = manifests().update_policies(&input, &nginx(), &update).unwrap();
    assert_eq!(
        out,
        format!("{other}{}", manifest(&[("flux.weave.works/automated", "'true'")]))
    );
}
