//! Line-level scanning of YAML text
//!
//! Just enough of YAML's block syntax to find keys, their values and their
//! extent without re-emitting anything.

/// One physical line of a buffer
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    /// Offset of the first byte
    pub start: usize,
    /// Offset of the next line (past the newline, or the buffer end)
    pub next: usize,
    /// Content without the line terminator
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Number of leading spaces
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    /// Content after the indentation
    pub fn body(&self) -> &'a str {
        &self.text[self.indent()..]
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with('#')
    }

    /// Neither blank nor a comment
    pub fn is_content(&self) -> bool {
        !self.is_blank() && !self.is_comment()
    }
}

/// Split text into lines, keeping byte offsets
pub(crate) fn lines(text: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let (end, next) = match text[start..].find('\n') {
            Some(i) => (start + i, start + i + 1),
            None => (text.len(), text.len()),
        };
        let line = &text[start..end];
        out.push(Line {
            start,
            next,
            text: line.strip_suffix('\r').unwrap_or(line),
        });
        start = next;
    }

    out
}

/// A mapping key found at the start of a line body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyToken<'a> {
    /// Key exactly as written, quotes included
    pub raw: &'a str,
    /// Decoded key
    pub key: String,
    /// Offset in the body just past the `:`
    pub after_colon: usize,
}

/// Parse `key:` at the start of a line body.
///
/// Returns `None` for sequence items, comments, flow collections, complex
/// keys and lines without a key.
pub(crate) fn parse_key(body: &str) -> Option<KeyToken<'_>> {
    let first = body.chars().next()?;
    match first {
        '"' | '\'' => {
            let close = quoted_end(body)?;
            let raw = &body[..close];
            let key: String = serde_yaml::from_str(raw).ok()?;
            let rest = &body[close..];
            let colon = close + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
            if !body[colon..].starts_with(':') || !ends_indicator(&body[colon + 1..]) {
                return None;
            }
            Some(KeyToken {
                raw,
                key,
                after_colon: colon + 1,
            })
        }
        '#' | '-' | '{' | '[' | '?' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' => {
            // `-foo: x` is a plain key, `- foo: x` is a sequence item
            if first == '-' && body.len() > 1 && !body[1..].starts_with([' ', '\t']) {
                plain_key(body)
            } else {
                None
            }
        }
        _ => plain_key(body),
    }
}

fn plain_key(body: &str) -> Option<KeyToken<'_>> {
    let bytes = body.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b':' if ends_indicator(&body[i + 1..]) => {
                let raw = body[..i].trim_end();
                if raw.is_empty() {
                    return None;
                }
                return Some(KeyToken {
                    raw,
                    key: raw.to_string(),
                    after_colon: i + 1,
                });
            }
            b'#' if i > 0 && matches!(bytes[i - 1], b' ' | b'\t') => return None,
            _ => {}
        }
    }
    None
}

fn ends_indicator(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with([' ', '\t'])
}

/// Offset just past the closing quote of a quoted scalar starting `s`
fn quoted_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b'\'' if quote == b'\'' => {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                } else {
                    return Some(i + 1);
                }
            }
            b'"' if quote == b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Split the text after a `key:` into the value and any trailing comment.
///
/// Returns the offset where the value starts and where it ends; the value
/// is empty when the key opens a nested block.
pub(crate) fn inline_value(rest: &str) -> (usize, usize) {
    let start = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let value = &rest[start..];
    if value.is_empty() || value.starts_with('#') {
        return (start, start);
    }

    if value.starts_with(['\'', '"']) {
        if let Some(end) = quoted_end(value) {
            return (start, start + end);
        }
    }

    let bytes = value.as_bytes();
    let mut end = value.len();
    for i in 1..bytes.len() {
        if bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t') {
            end = i;
            break;
        }
    }
    (start, start + value[..end].trim_end().len())
}
