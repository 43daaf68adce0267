//! Identifier validation and the reference value types built on it.
//!
//! Every name that reaches a rendered query (collection, field path,
//! parameter, output alias) passes through [`validate_identifier`] or
//! [`validate_field_path`]. Both return a typed [`InvalidReason`] instead of a
//! bare boolean so callers can report what was wrong.

use crate::error::{DocqlError, DocqlResult};
use serde::Serialize;
use std::fmt;

/// Substrings rejected anywhere in a lower-cased identifier.
pub const SUSPICIOUS_PATTERNS: &[&str] = &[
    ";", "--", "/*", "*/", "'", "\"", "`", "\\", " or ", " and ", "drop ", "delete ", "insert ",
    "update ", "select ", "union ", "exec",
];

/// Marker allowed as the first character of a field path segment.
pub const FIELD_MARKER: char = '$';

/// Which kind of name was being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Collection,
    Field,
    Param,
    Alias,
}

impl fmt::Display for IdentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentKind::Collection => write!(f, "collection"),
            IdentKind::Field => write!(f, "field"),
            IdentKind::Param => write!(f, "parameter"),
            IdentKind::Alias => write!(f, "alias"),
        }
    }
}

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("must not be empty")]
    Empty,
    #[error("must not contain whitespace")]
    Whitespace,
    #[error("path segments must not be empty")]
    EmptySegment,
    #[error("must start with a letter or underscore, found '{0}'")]
    InvalidStart(char),
    #[error("contains invalid character '{0}'")]
    InvalidChar(char),
    #[error("contains suspicious pattern '{0}'")]
    Suspicious(&'static str),
}

/// Validate a plain identifier (collection, parameter, alias).
pub fn validate_identifier(s: &str) -> Result<(), InvalidReason> {
    precheck(s)?;
    validate_segment(s, false)?;
    scan_denylist(s)
}

/// Validate a dot-separated field path. Segments may start with `$`.
pub fn validate_field_path(s: &str) -> Result<(), InvalidReason> {
    precheck(s)?;
    for segment in s.split('.') {
        if segment.is_empty() {
            return Err(InvalidReason::EmptySegment);
        }
        validate_segment(segment, true)?;
    }
    scan_denylist(s)
}

pub fn is_valid_identifier(s: &str) -> bool {
    validate_identifier(s).is_ok()
}

pub fn is_valid_field_path(s: &str) -> bool {
    validate_field_path(s).is_ok()
}

fn precheck(s: &str) -> Result<(), InvalidReason> {
    if s.is_empty() {
        return Err(InvalidReason::Empty);
    }
    if s.chars().any(char::is_whitespace) {
        return Err(InvalidReason::Whitespace);
    }
    Ok(())
}

fn validate_segment(segment: &str, allow_marker: bool) -> Result<(), InvalidReason> {
    let mut chars = segment.chars();
    if let Some(first) = chars.next() {
        let ok = first.is_ascii_alphabetic() || first == '_' || (allow_marker && first == FIELD_MARKER);
        if !ok {
            return Err(InvalidReason::InvalidStart(first));
        }
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(InvalidReason::InvalidChar(c));
        }
    }
    Ok(())
}

fn scan_denylist(s: &str) -> Result<(), InvalidReason> {
    let lower = s.to_lowercase();
    match SUSPICIOUS_PATTERNS.iter().find(|p| lower.contains(**p)) {
        Some(pattern) => Err(InvalidReason::Suspicious(pattern)),
        None => Ok(()),
    }
}

/// Validate an output alias (accumulator name, lookup `as`, computed field).
pub(crate) fn check_alias(name: &str) -> DocqlResult<()> {
    validate_identifier(name).map_err(|r| DocqlError::invalid_identifier(IdentKind::Alias, name, r))
}

/// A named document container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Collection {
    name: String,
}

impl Collection {
    pub fn try_new(name: impl Into<String>) -> DocqlResult<Self> {
        let name = name.into();
        validate_identifier(&name)
            .map_err(|r| DocqlError::invalid_identifier(IdentKind::Collection, name.clone(), r))?;
        Ok(Self { name })
    }

    /// Panics if `name` is not a valid identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::try_new(name).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Skips validation, for exercising checks further down the pipeline.
    #[cfg(test)]
    pub(crate) fn unchecked(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A (possibly nested) path inside a collection's documents.
///
/// Ordering and equality consider the path first, then the owning
/// collection, so field maps iterate in path order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Field {
    path: String,
    collection: String,
}

impl Field {
    pub fn try_new(collection: impl Into<String>, path: impl Into<String>) -> DocqlResult<Self> {
        let collection = collection.into();
        let path = path.into();
        validate_identifier(&collection)
            .map_err(|r| DocqlError::invalid_identifier(IdentKind::Collection, collection.clone(), r))?;
        validate_field_path(&path)
            .map_err(|r| DocqlError::invalid_identifier(IdentKind::Field, path.clone(), r))?;
        Ok(Self { path, collection })
    }

    /// Panics if either name is invalid.
    pub fn new(collection: impl Into<String>, path: impl Into<String>) -> Self {
        Self::try_new(collection, path).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.path)
    }
}

/// A named placeholder for a value bound at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Param {
    name: String,
}

impl Param {
    pub fn try_new(name: impl Into<String>) -> DocqlResult<Self> {
        let name = name.into();
        validate_identifier(&name)
            .map_err(|r| DocqlError::invalid_identifier(IdentKind::Param, name.clone(), r))?;
        Ok(Self { name })
    }

    /// Panics if `name` is not a valid identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::try_new(name).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The placeholder emitted in rendered output, e.g. `:status`.
    pub fn placeholder(&self) -> String {
        format!(":{}", self.name)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["users", "_id", "createdAt", "order_items2", "A"] {
            assert!(is_valid_identifier(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejection_order() {
        assert_eq!(validate_identifier(""), Err(InvalidReason::Empty));
        assert_eq!(validate_identifier("a b"), Err(InvalidReason::Whitespace));
        assert_eq!(validate_identifier("a\tb"), Err(InvalidReason::Whitespace));
        assert_eq!(validate_identifier("1abc"), Err(InvalidReason::InvalidStart('1')));
        assert_eq!(validate_identifier("ab;c"), Err(InvalidReason::InvalidChar(';')));
        assert_eq!(validate_identifier("$id"), Err(InvalidReason::InvalidStart('$')));
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        assert_eq!(validate_identifier("EXEC_proc"), Err(InvalidReason::Suspicious("exec")));
        assert_eq!(validate_identifier("run_exec"), Err(InvalidReason::Suspicious("exec")));
    }

    #[test]
    fn test_field_paths() {
        assert!(is_valid_field_path("address.city"));
        assert!(is_valid_field_path("$meta.score"));
        assert!(is_valid_field_path("items._id"));
        assert_eq!(validate_field_path("address..city"), Err(InvalidReason::EmptySegment));
        assert_eq!(validate_field_path(".city"), Err(InvalidReason::EmptySegment));
        assert_eq!(validate_field_path("address.9city"), Err(InvalidReason::InvalidStart('9')));
        assert_eq!(validate_field_path("a.b-c"), Err(InvalidReason::InvalidChar('-')));
    }

    #[test]
    fn test_param_constructors() {
        let p = Param::try_new("status").unwrap();
        assert_eq!(p.name(), "status");
        assert_eq!(p.placeholder(), ":status");

        let err = Param::try_new("x; drop").unwrap_err();
        assert!(matches!(
            err,
            DocqlError::InvalidIdentifier { kind: IdentKind::Param, .. }
        ));
    }

    #[test]
    #[should_panic(expected = "Invalid parameter name")]
    fn test_param_new_panics() {
        Param::new("bad name");
    }

    #[test]
    fn test_field_ordering_by_path() {
        let a = Field::new("users", "age");
        let b = Field::new("accounts", "email");
        assert!(a < b);
        assert_eq!(a.to_string(), "users.age");
    }
}
