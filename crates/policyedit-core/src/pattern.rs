//! Image tag patterns
//!
//! A tag policy value is either `<kind>:<pattern>` or a bare literal:
//!
//! - `glob:1.*` - shell-style glob
//! - `semver:~1.2` - semantic version requirement
//! - `regexp:^v[0-9]+$` - regular expression (unanchored)
//! - `1.2.3` - exact match
//!
//! Each prefixed kind is a [`PatternKind`] looked up by its prefix.

use std::fmt;

use regex::Regex;
use semver::{Version, VersionReq};

/// A family of tag patterns selected by prefix
pub trait PatternKind: Sync {
    /// Prefix before the `:` separator
    fn prefix(&self) -> &'static str;

    /// Check that `pattern` is well formed for this kind
    fn validate(&self, pattern: &str) -> Result<(), String>;

    /// Test a tag against an already validated pattern
    fn matches(&self, pattern: &str, tag: &str) -> bool;
}

/// Shell-style globbing. Any string is accepted.
pub struct Glob;

impl PatternKind for Glob {
    fn prefix(&self) -> &'static str {
        "glob"
    }

    fn validate(&self, _pattern: &str) -> Result<(), String> {
        Ok(())
    }

    fn matches(&self, pattern: &str, tag: &str) -> bool {
        match glob::Pattern::new(pattern) {
            Ok(p) => p.matches(tag),
            Err(_) => pattern == tag,
        }
    }
}

/// Semantic version requirements, e.g. `^1.2` or `*`
pub struct Semver;

impl PatternKind for Semver {
    fn prefix(&self) -> &'static str {
        "semver"
    }

    fn validate(&self, pattern: &str) -> Result<(), String> {
        VersionReq::parse(pattern)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn matches(&self, pattern: &str, tag: &str) -> bool {
        let Ok(req) = VersionReq::parse(pattern) else {
            return false;
        };
        let tag = tag.strip_prefix('v').unwrap_or(tag);
        Version::parse(tag).is_ok_and(|v| req.matches(&v))
    }
}

/// Regular expressions, matched anywhere in the tag
pub struct Regexp;

impl PatternKind for Regexp {
    fn prefix(&self) -> &'static str {
        "regexp"
    }

    fn validate(&self, pattern: &str) -> Result<(), String> {
        Regex::new(pattern).map(|_| ()).map_err(|e| e.to_string())
    }

    fn matches(&self, pattern: &str, tag: &str) -> bool {
        Regex::new(pattern).is_ok_and(|re| re.is_match(tag))
    }
}

/// All known pattern kinds
pub static PATTERN_KINDS: &[&dyn PatternKind] = &[&Glob, &Semver, &Regexp];

/// Find the pattern kind registered for a prefix
pub fn pattern_kind(prefix: &str) -> Option<&'static dyn PatternKind> {
    PATTERN_KINDS.iter().copied().find(|k| k.prefix() == prefix)
}

/// A validated tag pattern
#[derive(Clone)]
pub struct TagPattern {
    raw: String,
    kind: Option<&'static dyn PatternKind>,
    pattern: String,
}

impl TagPattern {
    /// Parse and validate a tag policy value.
    ///
    /// Values without a recognized prefix are literal patterns and always
    /// valid. On failure the validator's message is returned.
    pub fn parse(value: &str) -> Result<Self, String> {
        if let Some((prefix, pattern)) = value.split_once(':') {
            if let Some(kind) = pattern_kind(prefix) {
                kind.validate(pattern)?;
                return Ok(Self {
                    raw: value.to_string(),
                    kind: Some(kind),
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(Self {
            raw: value.to_string(),
            kind: None,
            pattern: value.to_string(),
        })
    }

    /// The value exactly as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Prefix of the pattern kind, `None` for literal patterns
    pub fn kind(&self) -> Option<&'static str> {
        self.kind.map(|k| k.prefix())
    }

    /// The pattern without its prefix
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Test an image tag against this pattern
    pub fn matches(&self, tag: &str) -> bool {
        match self.kind {
            Some(kind) => kind.matches(&self.pattern, tag),
            None => self.pattern == tag,
        }
    }
}

impl fmt::Debug for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagPattern")
            .field("kind", &self.kind())
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl fmt::Display for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for TagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TagPattern {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_patterns() {
        for value in ["glob:*", "semver:*", "semver:~1.2", "regexp:(.*?)", "foo", "1.2.3"] {
            assert!(TagPattern::parse(value).is_ok(), "{value} should be valid");
        }
    }

    #[test]
    fn test_invalid_semver() {
        assert!(TagPattern::parse("semver:invalid").is_err());
    }

    #[test]
    fn test_invalid_regexp() {
        // a lone repetition operator has nothing to repeat
        assert!(TagPattern::parse("regexp:*").is_err());
    }

    #[test]
    fn test_glob_accepts_anything() {
        assert!(TagPattern::parse("glob:[").is_ok());
    }

    #[test]
    fn test_unknown_prefix_is_literal() {
        let p = TagPattern::parse("sha256:abc").unwrap();
        assert_eq!(p.kind(), None);
        assert!(p.matches("sha256:abc"));
        assert!(!p.matches("abc"));
    }

    #[test]
    fn test_kind_and_pattern() {
        let p = TagPattern::parse("semver:^1.0").unwrap();
        assert_eq!(p.kind(), Some("semver"));
        assert_eq!(p.pattern(), "^1.0");
        assert_eq!(p.as_str(), "semver:^1.0");
    }

    #[test]
    fn test_glob_matching() {
        let p = TagPattern::parse("glob:master-*").unwrap();
        assert!(p.matches("master-a1b2c3"));
        assert!(!p.matches("dev-a1b2c3"));

        let any = TagPattern::parse("glob:*").unwrap();
        assert!(any.matches("anything"));
    }

    #[test]
    fn test_semver_matching() {
        let p = TagPattern::parse("semver:~1.2").unwrap();
        assert!(p.matches("1.2.7"));
        assert!(p.matches("v1.2.0"));
        assert!(!p.matches("1.3.0"));
        assert!(!p.matches("latest"));
    }

    #[test]
    fn test_regexp_matching() {
        let p = TagPattern::parse("regexp:^v[0-9]+$").unwrap();
        assert!(p.matches("v12"));
        assert!(!p.matches("v12-rc"));

        let unanchored = TagPattern::parse("regexp:rc").unwrap();
        assert!(unanchored.matches("1.0.0-rc.1"));
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(pattern_kind("glob").map(|k| k.prefix()), Some("glob"));
        assert!(pattern_kind("wildcard").is_none());
    }
}
