// Copyright (c) 2025 Backplane Contributors
// SPDX-License-Identifier: MIT

//! Addressable attribute paths.
//!
//! Every attribute in the system is addressed by an ordered sequence of
//! segments. Two representations denote the same path: a single bare atom
//! (`"name"`) or a `/`-joined string where individual segments may carry a
//! leading `:` symbolic tag (`"server/:status"`). The tag is a notational
//! artifact and is stripped during parsing; path equality is structural over
//! the normalized segments, never representational.

use std::fmt;

/// A parse failure for an addressable path.
///
/// Raised for the empty string and for paths containing empty segments
/// (`"a//b"`). Declaration sites treat this as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub raw: String,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed attribute path '{}'", self.raw)
    }
}

impl std::error::Error for PathError {}

/// A normalized, ordered sequence of attribute path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    /// Build a path from pre-normalized segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttrPath(segments.into_iter().map(Into::into).collect())
    }

    /// Build a single-segment path from one atom.
    pub fn atom<S: Into<String>>(segment: S) -> Self {
        AttrPath(vec![segment.into()])
    }

    /// Parse a `/`-joined representation, stripping symbolic `:` tags.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError { raw: raw.to_string() });
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            let segment = segment.strip_prefix(':').unwrap_or(segment);
            if segment.is_empty() {
                return Err(PathError { raw: raw.to_string() });
            }
            segments.push(segment.to_string());
        }

        Ok(AttrPath(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First segment, if any.
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The path with its first segment removed.
    pub fn tail(&self) -> AttrPath {
        AttrPath(self.0.iter().skip(1).cloned().collect())
    }

    /// A new path with `segment` appended.
    pub fn child<S: Into<String>>(&self, segment: S) -> AttrPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        AttrPath(segments)
    }

    /// A new path with `other`'s segments appended.
    pub fn join(&self, other: &AttrPath) -> AttrPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        AttrPath(segments)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for AttrPath {
    /// Infallible conversion for trusted literals: malformed input collapses
    /// to an empty path, which no store can hold.
    fn from(raw: &str) -> Self {
        AttrPath::parse(raw).unwrap_or_else(|_| AttrPath(Vec::new()))
    }
}

impl From<Vec<String>> for AttrPath {
    fn from(segments: Vec<String>) -> Self {
        AttrPath(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_atom() {
        let path = AttrPath::parse("name").unwrap();
        assert_eq!(path.segments(), &["name".to_string()]);
        assert_eq!(path, AttrPath::atom("name"));
    }

    #[test]
    fn parse_joined_segments() {
        let path = AttrPath::parse("server/network/ip").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.head(), Some("server"));
        assert_eq!(path.tail(), AttrPath::parse("network/ip").unwrap());
    }

    #[test]
    fn symbolic_tags_are_structural_noise() {
        // ":a/b" and "a/:b" and "a/b" all denote the same path
        let tagged = AttrPath::parse(":a/b").unwrap();
        let mixed = AttrPath::parse("a/:b").unwrap();
        let plain = AttrPath::parse("a/b").unwrap();
        assert_eq!(tagged, plain);
        assert_eq!(mixed, plain);
        assert_eq!(plain, AttrPath::new(["a", "b"]));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert!(AttrPath::parse("").is_err());
        assert!(AttrPath::parse("a//b").is_err());
        assert!(AttrPath::parse("a/").is_err());
        assert!(AttrPath::parse(":").is_err());
    }

    #[test]
    fn display_round_trips_plain_paths() {
        let path = AttrPath::parse("a/b/c").unwrap();
        assert_eq!(path.to_string(), "a/b/c");
        assert_eq!(AttrPath::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn child_and_join_extend_paths() {
        let base = AttrPath::atom("server");
        assert_eq!(base.child("ip"), AttrPath::parse("server/ip").unwrap());
        let joined = base.join(&AttrPath::parse("net/ip").unwrap());
        assert_eq!(joined, AttrPath::parse("server/net/ip").unwrap());
    }
}
