//! policyedit Manifest - policy annotations on Kubernetes manifest files
//!
//! This crate provides:
//! - **Document splitting**: multi-document YAML files as byte spans
//! - **Resource lookup**: find the one document defining a resource, with
//!   pluggable namespace resolution
//! - **Container discovery**: container names of pod templates
//! - **Annotation editing**: rewrite `metadata.annotations` while keeping
//!   comments, ordering and formatting byte for byte
//! - **Policy updates**: add and remove policies as one atomic rewrite
//!
//! ```
//! use policyedit_core::{Policy, PolicyUpdate};
//! use policyedit_manifest::{ConstNamespacer, Manifests};
//!
//! let manifest = "kind: Deployment\nmetadata:\n  name: web\n";
//! let update = PolicyUpdate::new().add(Policy::Automated, "true");
//! let out = Manifests::new(ConstNamespacer::new("default"))
//!     .update_policies(manifest, &"default:deployment/web".parse().unwrap(), &update)
//!     .unwrap();
//! assert_eq!(
//!     out,
//!     "kind: Deployment\nmetadata:\n  name: web\n  annotations:\n    flux.weave.works/automated: 'true'\n"
//! );
//! ```

pub mod annotations;
pub mod containers;
pub mod document;
pub mod error;
pub mod locator;
pub mod namespace;
mod text;
pub mod update;

pub use annotations::{AnnotationBlock, AnnotationEditor, AnnotationEntry, AnnotationsLocation};
pub use containers::discover_containers;
pub use document::{DocumentSpan, ParsedDocument, ResourceHeader, parse_document, split_documents};
pub use error::{ManifestError, Result};
pub use locator::locate_resource;
pub use namespace::{ConstNamespacer, DefaultNamespacer, Namespacer, ResourceScopes};
pub use update::Manifests;
