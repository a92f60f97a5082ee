//! Dotted component paths and selectors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const SEPARATOR: char = '.';
const SUBTREE_SUFFIX: &str = ".*";

/// Why a path string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath {
    pub input: String,
    pub reason: &'static str,
}

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.input, self.reason)
    }
}

impl std::error::Error for InvalidPath {}

/// A position in the namespace tree, e.g. `GameObjects.Factories.Sprite`.
///
/// Segments are case-sensitive identifiers (`[A-Za-z_$][A-Za-z0-9_$]*`) so that
/// every path can be rendered as an unquoted object key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentPath(Vec<Arc<str>>);

impl ComponentPath {
    /// The empty path, denoting the namespace root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from individual segments, validating each one.
    ///
    /// # Errors
    /// Returns [`InvalidPath`] if any segment is not an identifier.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, InvalidPath>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for segment in segments {
            let segment = segment.as_ref();
            validate_segment(segment)?;
            out.push(Arc::from(segment));
        }
        Ok(Self(out))
    }

    /// Parses a non-empty dotted path.
    ///
    /// # Errors
    /// Returns [`InvalidPath`] for empty input, empty segments or non-identifier segments.
    pub fn parse(input: &str) -> Result<Self, InvalidPath> {
        if input.is_empty() {
            return Err(InvalidPath { input: String::new(), reason: "path is empty" });
        }
        Self::from_segments(input.split(SEPARATOR)).map_err(|e| InvalidPath {
            input: input.to_owned(),
            reason: e.reason,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// Appends one segment. The caller guarantees `segment` came from a validated key.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Arc::from(segment));
        Self(segments)
    }

    /// Concatenates `suffix` onto this path.
    #[must_use]
    pub fn join(&self, suffix: &Self) -> Self {
        let mut segments = self.0.clone();
        segments.extend(suffix.0.iter().cloned());
        Self(segments)
    }

    /// `true` if `self` equals `other` or lies underneath it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Returns the remainder of `self` below `prefix`.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        self.0.strip_prefix(prefix.0.as_slice()).map(|rest| Self(rest.to_vec()))
    }
}

fn validate_segment(segment: &str) -> Result<(), InvalidPath> {
    let invalid = |reason| Err(InvalidPath { input: segment.to_owned(), reason });

    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return invalid("empty segment");
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return invalid("segment must start with a letter, '_' or '$'");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return invalid("segment contains characters outside [A-Za-z0-9_$]");
    }
    Ok(())
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentPath({self})")
    }
}

impl FromStr for ComponentPath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ComponentPath {
    type Error = InvalidPath;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for ComponentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComponentPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Selects either one catalog leaf (`A.B`) or a whole catalog subtree (`A.B.*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSelector {
    Leaf(ComponentPath),
    Subtree(ComponentPath),
}

impl PathSelector {
    /// # Errors
    /// Returns [`InvalidPath`] if the underlying path is malformed.
    pub fn parse(input: &str) -> Result<Self, InvalidPath> {
        match input.strip_suffix(SUBTREE_SUFFIX) {
            Some(prefix) => ComponentPath::parse(prefix).map(Self::Subtree),
            None => ComponentPath::parse(input).map(Self::Leaf),
        }
    }

    #[must_use]
    pub const fn path(&self) -> &ComponentPath {
        match self {
            Self::Leaf(path) | Self::Subtree(path) => path,
        }
    }

    /// `true` if the catalog leaf at `path` falls under this selector.
    #[must_use]
    pub fn covers(&self, path: &ComponentPath) -> bool {
        match self {
            Self::Leaf(own) => own == path,
            Self::Subtree(prefix) => path.len() > prefix.len() && path.starts_with(prefix),
        }
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(path) => write!(f, "{path}"),
            Self::Subtree(path) => write!(f, "{path}{SUBTREE_SUFFIX}"),
        }
    }
}

impl FromStr for PathSelector {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PathSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Checks that `key` can be used as a namespace key.
///
/// # Errors
/// Returns [`InvalidPath`] if `key` is not an identifier.
pub fn validate_key(key: &str) -> Result<(), InvalidPath> {
    validate_segment(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_dotted_paths() {
        let path = ComponentPath::parse("GameObjects.Factories.Sprite").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some("Sprite"));
        assert_eq!(path.to_string(), "GameObjects.Factories.Sprite");
        assert_eq!(path.parent().unwrap().to_string(), "GameObjects.Factories");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "A..B", ".A", "A.", "A.2D", "A.B-C", "A.*.B", "A B"] {
            assert!(ComponentPath::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn paths_are_case_sensitive() {
        let upper = ComponentPath::parse("Math.Between").unwrap();
        let lower = ComponentPath::parse("math.between").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn prefix_helpers() {
        let root = ComponentPath::parse("Sound").unwrap();
        let leaf = ComponentPath::parse("Sound.WebAudioSound").unwrap();
        assert!(leaf.starts_with(&root));
        assert!(!root.starts_with(&leaf));
        assert_eq!(leaf.strip_prefix(&root).unwrap().to_string(), "WebAudioSound");
        assert_eq!(root.join(&ComponentPath::parse("X.Y").unwrap()).to_string(), "Sound.X.Y");
    }

    #[test]
    fn selector_covers_leaf_or_strict_descendants() {
        let subtree = PathSelector::parse("Sound.*").unwrap();
        let leaf = PathSelector::parse("Renderer.WebGL").unwrap();

        assert!(subtree.covers(&ComponentPath::parse("Sound.BaseSound").unwrap()));
        assert!(!subtree.covers(&ComponentPath::parse("Sound").unwrap()));
        assert!(leaf.covers(&ComponentPath::parse("Renderer.WebGL").unwrap()));
        assert!(!leaf.covers(&ComponentPath::parse("Renderer.Canvas").unwrap()));
        assert_eq!(subtree.to_string(), "Sound.*");
    }
}
