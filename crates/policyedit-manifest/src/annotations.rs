//! Editing `metadata.annotations` in place
//!
//! The editor reads the lines of one document to find the annotations
//! mapping and its entries, then produces byte-range edits. Everything
//! outside the edited ranges is copied through untouched: comments, key
//! order, quoting, indentation and the other annotations.
//!
//! ```yaml
//! metadata:            # <- top-level `metadata:` block
//!   name: nginx
//!   annotations:       # <- header
//!     prometheus.io/scrape: 'false'
//!     flux.weave.works/locked_msg: |-
//!       first line
//!
//!       third line     # <- blank and deeper lines belong to the entry
//! spec: {}
//! ```

use std::collections::HashSet;
use std::ops::Range;

use serde_yaml::{Mapping, Value};
use tracing::trace;

use crate::document::scalar_to_string;
use crate::error::{ManifestError, Result};
use crate::text::{self, Line, inline_value, parse_key};

const DEFAULT_INDENT: usize = 2;

/// One `key: value` entry of the annotations mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEntry {
    /// Key as written, including any quotes
    pub raw_key: String,
    /// Decoded key
    pub key: String,
    /// Whole entry, from the start of the key line through the end of the
    /// value (newline included)
    pub range: Range<usize>,
    /// The value text on the key line, without any trailing comment
    pub value: Range<usize>,
    /// Whether the value continues on following lines
    pub multiline: bool,
}

/// An existing `annotations:` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationBlock {
    /// The `annotations:` line, newline included
    pub header: Range<usize>,
    /// Indentation of the header
    pub indent: usize,
    /// Indentation of the entries
    pub entry_indent: usize,
    /// Header written as `annotations: {}` or `annotations: null`
    pub flow_empty: bool,
    pub entries: Vec<AnnotationEntry>,
    /// Where new entries are inserted
    pub insert_at: usize,
}

/// Where the annotations of a document are, or would go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationsLocation {
    Block(AnnotationBlock),
    /// No `annotations:` key under `metadata`
    Absent {
        /// End of the `metadata` mapping
        insert_at: usize,
        /// Indentation for a new header
        indent: usize,
        /// Indentation for new entries
        entry_indent: usize,
    },
}

/// A byte-range replacement on the document text
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    text: String,
}

/// Annotation editor for one document
#[derive(Debug)]
pub struct AnnotationEditor<'a> {
    text: &'a str,
    document: usize,
    location: AnnotationsLocation,
    /// Line terminator of the document, `\n` or `\r\n`
    eol: &'static str,
}

impl<'a> AnnotationEditor<'a> {
    /// Scan a document. `document` is its index in the file, for errors.
    pub fn new(text: &'a str, document: usize) -> Result<Self> {
        let location = locate(text, document)?;
        Ok(Self {
            text,
            document,
            location,
            eol: line_ending(text),
        })
    }

    pub fn location(&self) -> &AnnotationsLocation {
        &self.location
    }

    /// Entries in source order; empty when there is no annotations block
    pub fn entries(&self) -> &[AnnotationEntry] {
        match &self.location {
            AnnotationsLocation::Block(block) => &block.entries,
            AnnotationsLocation::Absent { .. } => &[],
        }
    }

    /// Delete the entries with these keys. Removing the last entry removes
    /// the `annotations:` header too.
    pub fn remove_entries(&self, keys: &[String]) -> Result<String> {
        self.apply(keys, &[])
    }

    /// Set each key to its value, appending keys that do not exist yet
    pub fn upsert_entries(&self, pairs: &[(String, String)]) -> Result<String> {
        self.apply(&[], pairs)
    }

    /// Remove `remove` and then upsert `add`, as one rewrite.
    pub fn apply(&self, remove: &[String], add: &[(String, String)]) -> Result<String> {
        let edits = self.plan(remove, add)?;
        trace!(document = self.document, edits = edits.len(), "annotation edit plan");
        Ok(apply_edits(self.text, edits))
    }

    fn plan(&self, remove: &[String], add: &[(String, String)]) -> Result<Vec<Edit>> {
        let remove: HashSet<&str> = remove.iter().map(String::as_str).collect();

        match &self.location {
            AnnotationsLocation::Absent {
                insert_at,
                indent,
                entry_indent,
            } => {
                if add.is_empty() {
                    return Ok(Vec::new());
                }
                let mut block = format!("{}annotations:{}", " ".repeat(*indent), self.eol);
                for (key, value) in add {
                    block.push_str(&render_entry(
                        *entry_indent,
                        &render_key(key)?,
                        value,
                        self.eol,
                    )?);
                }
                Ok(vec![self.insertion(*insert_at, block)])
            }
            AnnotationsLocation::Block(block) => self.plan_block(block, &remove, add),
        }
    }

    fn plan_block(
        &self,
        block: &AnnotationBlock,
        remove: &HashSet<&str>,
        add: &[(String, String)],
    ) -> Result<Vec<Edit>> {
        let mut edits = Vec::new();
        let mut removed = 0;

        for entry in &block.entries {
            if remove.contains(entry.key.as_str()) {
                edits.push(Edit {
                    range: entry.range.clone(),
                    text: String::new(),
                });
                removed += 1;
            }
        }

        let mut appended = String::new();
        for (key, value) in add {
            let existing = block
                .entries
                .iter()
                .find(|e| &e.key == key && !remove.contains(e.key.as_str()));
            match existing {
                Some(entry) => {
                    if self.decode_value(entry).as_deref() == Some(value.as_str()) {
                        continue;
                    }
                    edits.push(self.replace_value(entry, block.entry_indent, value)?);
                }
                None => {
                    appended.push_str(&render_entry(
                        block.entry_indent,
                        &render_key(key)?,
                        value,
                        self.eol,
                    )?);
                }
            }
        }

        let remaining = block.entries.len() - removed;
        if block.flow_empty {
            if !appended.is_empty() {
                let header = format!(
                    "{}annotations:{}{}",
                    " ".repeat(block.indent),
                    self.header_comment(block),
                    self.eol
                );
                edits.push(Edit {
                    range: block.header.clone(),
                    text: header + &appended,
                });
            }
        } else if !appended.is_empty() {
            edits.push(self.insertion(block.insert_at, appended));
        } else if removed > 0 && remaining == 0 {
            edits.push(Edit {
                range: block.header.clone(),
                text: String::new(),
            });
        }

        Ok(edits)
    }

    /// Read the current value of an entry as a string
    fn decode_value(&self, entry: &AnnotationEntry) -> Option<String> {
        let mapping: Mapping = serde_yaml::from_str(&self.text[entry.range.clone()]).ok()?;
        let (_, value) = mapping.into_iter().next()?;
        match value {
            Value::Null => None,
            value => scalar_to_string(&value),
        }
    }

    fn replace_value(&self, entry: &AnnotationEntry, indent: usize, value: &str) -> Result<Edit> {
        let serialized = serialize_scalar(value)?;
        if entry.multiline || serialized.contains('\n') {
            return Ok(Edit {
                range: entry.range.clone(),
                text: render_entry(indent, &entry.raw_key, value, self.eol)?,
            });
        }
        // keep spacing and any trailing comment on the key line; a null
        // value needs separators so the comment stays a comment
        let text = if entry.value.is_empty() {
            let before = &self.text[..entry.value.start];
            let after = &self.text[entry.value.start..];
            let lead = if before.ends_with([' ', '\t']) { "" } else { " " };
            let trail = if after.starts_with('#') { " " } else { "" };
            format!("{lead}{serialized}{trail}")
        } else {
            serialized
        };
        Ok(Edit {
            range: entry.value.clone(),
            text,
        })
    }

    fn header_comment(&self, block: &AnnotationBlock) -> String {
        let line = self.text[block.header.clone()].trim_end_matches(['\n', '\r']);
        match line.find(" #") {
            Some(i) => line[i..].to_string(),
            None => String::new(),
        }
    }

    /// Insert text at an offset, supplying the newline the last line lacks
    fn insertion(&self, at: usize, text: String) -> Edit {
        let text = if at == self.text.len() && !self.text.is_empty() && !self.text.ends_with('\n')
        {
            format!("{}{text}", self.eol)
        } else {
            text
        };
        Edit {
            range: at..at,
            text,
        }
    }
}

fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    let mut out = text.to_string();
    for edit in edits {
        out.replace_range(edit.range, &edit.text);
    }
    out
}

/// Serialize a string as a single YAML scalar, without a trailing newline.
///
/// Strings that would read back as another type are quoted (`'true'`);
/// multi-line strings use a literal block.
pub fn serialize_scalar(value: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(value)?;
    Ok(yaml.strip_suffix('\n').unwrap_or(&yaml).to_string())
}

fn render_key(key: &str) -> Result<String> {
    let rendered = serialize_scalar(key)?;
    if rendered.contains('\n') {
        return Err(ManifestError::Serialization(format!(
            "annotation key {key:?} spans several lines"
        )));
    }
    Ok(rendered)
}

/// Render `key: value` lines at the given indentation
fn render_entry(indent: usize, raw_key: &str, value: &str, eol: &str) -> Result<String> {
    let pad = " ".repeat(indent);
    let serialized = serialize_scalar(value)?;
    let mut lines = serialized.split('\n');
    let first = lines.next().unwrap_or_default();

    let mut out = format!("{pad}{raw_key}: {first}{eol}");
    for line in lines {
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push_str(eol);
    }
    Ok(out)
}

/// The terminator of the first line, `\n` when there is none
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Find the annotations block of a document
pub fn locate(text: &str, document: usize) -> Result<AnnotationsLocation> {
    let lines = text::lines(text);
    let malformed = |message: &str| ManifestError::malformed(document, message);

    let top_indent = lines
        .iter()
        .find(|l| l.is_content() && !l.body().starts_with('%'))
        .map(Line::indent)
        .ok_or_else(|| malformed("document is empty"))?;

    let meta_idx = lines
        .iter()
        .position(|l| {
            l.is_content()
                && l.indent() == top_indent
                && parse_key(l.body()).is_some_and(|k| k.key == "metadata")
        })
        .ok_or_else(|| malformed("no top-level metadata mapping"))?;

    let meta_line = &lines[meta_idx];
    let meta_indent = meta_line.indent();
    if !opens_block(meta_line) {
        return Err(malformed("metadata must be a block mapping"));
    }

    // children of metadata: lines deeper than `metadata:` up to the next
    // content line at its level
    let mut child_indent = None;
    let mut meta_end = meta_line.next;
    let mut annotations_idx = None;
    let mut children_end = lines.len();

    for (i, line) in lines.iter().enumerate().skip(meta_idx + 1) {
        if line.is_blank() {
            continue;
        }
        if line.indent() <= meta_indent {
            if line.is_comment() {
                continue;
            }
            children_end = i;
            break;
        }
        meta_end = line.next;
        if line.is_comment() {
            continue;
        }
        let indent = *child_indent.get_or_insert(line.indent());
        if line.indent() == indent
            && annotations_idx.is_none()
            && parse_key(line.body()).is_some_and(|k| k.key == "annotations")
        {
            annotations_idx = Some(i);
        }
    }

    let child_indent = child_indent.unwrap_or(meta_indent + DEFAULT_INDENT);
    let unit = child_indent - meta_indent;

    let Some(header_idx) = annotations_idx else {
        return Ok(AnnotationsLocation::Absent {
            insert_at: meta_end,
            indent: child_indent,
            entry_indent: child_indent + unit,
        });
    };

    let header = &lines[header_idx];
    let flow_empty = if opens_block(header) {
        false
    } else if is_empty_flow(header) {
        true
    } else {
        return Err(malformed(
            "annotations must be a block mapping or empty; flow mappings are not supported",
        ));
    };

    let mut entries: Vec<AnnotationEntry> = Vec::new();
    let mut entry_indent = None;
    let mut open = false;

    for line in &lines[header_idx + 1..children_end] {
        if line.is_blank() {
            continue;
        }
        let indent = line.indent();
        if line.is_content() && indent <= child_indent {
            break;
        }
        if let (Some(ei), true) = (entry_indent, open) {
            if indent > ei {
                if let Some(entry) = entries.last_mut() {
                    entry.range.end = line.next;
                    entry.multiline = true;
                }
                continue;
            }
        }
        if line.is_comment() {
            open = false;
            continue;
        }
        if flow_empty {
            return Err(malformed("entries follow an empty flow annotations mapping"));
        }

        let ei = *entry_indent.get_or_insert(indent);
        if indent != ei {
            return Err(malformed("inconsistent indentation in annotations"));
        }
        let key = parse_key(line.body())
            .ok_or_else(|| malformed("annotations must be a mapping of keys to values"))?;

        let body_start = line.start + indent;
        let rest = &line.body()[key.after_colon..];
        let (vs, ve) = inline_value(rest);
        let value_start = body_start + key.after_colon + vs;
        let value_end = body_start + key.after_colon + ve;

        entries.push(AnnotationEntry {
            raw_key: key.raw.to_string(),
            key: key.key,
            range: line.start..line.next,
            value: value_start..value_end,
            multiline: false,
        });
        open = true;
    }

    let entry_indent = entry_indent.unwrap_or(child_indent + unit);
    let insert_at = entries
        .last()
        .map(|e| e.range.end)
        .unwrap_or(header.next);

    Ok(AnnotationsLocation::Block(AnnotationBlock {
        header: header.start..header.next,
        indent: child_indent,
        entry_indent,
        flow_empty,
        entries,
        insert_at,
    }))
}

/// `key:` with nothing but an optional comment after it
fn opens_block(line: &Line<'_>) -> bool {
    match parse_key(line.body()) {
        Some(key) => {
            let rest = &line.body()[key.after_colon..];
            let (s, e) = inline_value(rest);
            s == e
        }
        None => false,
    }
}

fn is_empty_flow(line: &Line<'_>) -> bool {
    let Some(key) = parse_key(line.body()) else {
        return false;
    };
    let rest = &line.body()[key.after_colon..];
    let (s, e) = inline_value(rest);
    matches!(rest[s..e].trim(), "{}" | "null" | "~" | "Null" | "NULL")
}
