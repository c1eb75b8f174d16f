//! Finding the document that defines a resource

use policyedit_core::ResourceId;
use tracing::{debug, trace};

use crate::document::{ParsedDocument, parse_document, split_documents};
use crate::error::{ManifestError, Result};
use crate::namespace::{Namespacer, ResourceScopes};

/// Find the single document in `buf` defining `id`.
///
/// Kind and name are compared first; the namespacer is only asked for
/// documents that match on both and declare no namespace themselves.
pub fn locate_resource<N: Namespacer + ?Sized>(
    buf: &str,
    id: &ResourceId,
    namespacer: &N,
    scopes: &ResourceScopes,
) -> Result<ParsedDocument> {
    let mut found = Vec::new();

    for span in split_documents(buf) {
        let Some(doc) = parse_document(buf, &span)? else {
            continue;
        };
        let header = &doc.header;
        if !header.kind.eq_ignore_ascii_case(id.kind()) || header.name() != id.name() {
            continue;
        }

        let namespace = match header.namespace() {
            Some(ns) => ns.to_string(),
            None => namespacer.effective_namespace(header, scopes)?,
        };
        trace!(document = span.index, %namespace, "candidate for {}", id);

        if id.matches(&namespace, &header.kind, header.name()) {
            found.push(doc);
        }
    }

    match found.len() {
        0 => Err(ManifestError::ResourceNotFound {
            resource: id.clone(),
        }),
        1 => {
            let doc = found.remove(0);
            debug!(document = doc.span.index, "located {}", id);
            Ok(doc)
        }
        count => Err(ManifestError::AmbiguousResource {
            resource: id.clone(),
            count,
        }),
    }
}
