//! Multi-document manifest splitting
//!
//! A manifest file may hold several YAML documents separated by `---` lines.
//! Splitting works on lines so that every document keeps its exact bytes;
//! `serde_yaml` is only used to read a document, never to write one.

use std::ops::Range;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::{ManifestError, Result};
use crate::text;

/// Byte range of one document within a manifest buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSpan {
    /// Position of the document in the file, counting from 0
    pub index: usize,
    /// Byte range, excluding the `---` separator lines
    pub range: Range<usize>,
}

impl DocumentSpan {
    pub fn text<'a>(&self, buf: &'a str) -> &'a str {
        &buf[self.range.clone()]
    }
}

/// Split a buffer into document spans.
///
/// The text before the first separator is a document too, possibly empty.
pub fn split_documents(buf: &str) -> Vec<DocumentSpan> {
    let mut spans = Vec::new();
    let mut start = 0;

    for line in text::lines(buf) {
        if is_document_marker(line.text) {
            spans.push(DocumentSpan {
                index: spans.len(),
                range: start..line.start,
            });
            start = line.next;
        }
    }

    spans.push(DocumentSpan {
        index: spans.len(),
        range: start..buf.len(),
    });
    spans
}

fn is_document_marker(line: &str) -> bool {
    match line.strip_prefix("---") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// The identifying fields of a Kubernetes object
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    metadata: Option<ObjectMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default, deserialize_with = "scalar_field")]
    name: Option<String>,
    #[serde(default, deserialize_with = "scalar_field")]
    namespace: Option<String>,
    #[serde(default)]
    annotations: Option<IndexMap<String, Value>>,
}

impl ResourceHeader {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: Some(ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or_default()
    }

    /// Namespace declared in the manifest, if any
    pub fn namespace(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.namespace.as_deref())
            .filter(|ns| !ns.is_empty())
    }

    /// Annotations as strings, in document order.
    ///
    /// Unquoted booleans and numbers are rendered back to their text form.
    pub fn annotations(&self) -> Vec<(&str, String)> {
        let Some(annotations) = self.metadata.as_ref().and_then(|m| m.annotations.as_ref())
        else {
            return Vec::new();
        };

        annotations
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.as_str(), s)))
            .collect()
    }
}

/// Accept any scalar for identifying fields, so `name: 2024` reads as "2024"
fn scalar_field<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// Render a scalar YAML value as the string it was written as
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// A document that describes a Kubernetes object
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub span: DocumentSpan,
    pub header: ResourceHeader,
    /// Read-only structural view of the document
    pub value: Value,
}

/// Parse one document.
///
/// Returns `Ok(None)` for documents that do not describe an object: empty or
/// comment-only text, non-mappings, and mappings without a `kind`.
pub fn parse_document(buf: &str, span: &DocumentSpan) -> Result<Option<ParsedDocument>> {
    let source = span.text(buf);
    if text::lines(source).iter().all(|l| l.is_blank() || l.is_comment()) {
        return Ok(None);
    }

    let value: Value = serde_yaml::from_str(source)
        .map_err(|e| ManifestError::malformed(span.index, e.to_string()))?;
    if !value.is_mapping() {
        return Ok(None);
    }

    let header: ResourceHeader = serde_yaml::from_value(value.clone())
        .map_err(|e| ManifestError::malformed(span.index, e.to_string()))?;
    if header.kind.is_empty() {
        return Ok(None);
    }

    Ok(Some(ParsedDocument {
        span: span.clone(),
        header,
        value,
    }))
}
