//! Build manifests: sparse selections over the catalog tree.
//!
//! In JSON form every key is an output name and every value is one of
//!
//! * `true`: the catalog leaf at the same position,
//! * `"Path.To.Leaf"`: a specific catalog leaf,
//! * `"Path.To.Node.*"`: a whole catalog subtree,
//! * `{ ... }`: a nested grouping (an empty object falls back to the leaf at its position).

use crate::ordered::OrderedMap;
use crate::path::PathSelector;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    /// Select the catalog leaf located where this node sits in the manifest.
    Implicit,
    Select(PathSelector),
    Group(Manifest),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, ManifestNode)>,
}

impl Manifest {
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an entry; later entries with an existing key are kept and rejected at resolve time.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: ManifestNode) -> Self {
        self.entries.push((key.into(), node));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ManifestNode)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, ManifestNode)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let OrderedMap(entries) = OrderedMap::deserialize(deserializer)?;
        Ok(Self { entries })
    }
}

impl<'de> Deserialize<'de> for ManifestNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ManifestNodeVisitor)
    }
}

struct ManifestNodeVisitor;

impl<'de> Visitor<'de> for ManifestNodeVisitor {
    type Value = ManifestNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("`true`, a catalog path string or a nested object")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        if v {
            Ok(ManifestNode::Implicit)
        } else {
            Err(E::invalid_value(de::Unexpected::Bool(false), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        PathSelector::parse(v).map(ManifestNode::Select).map_err(E::custom)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        Manifest::deserialize(de::value::MapAccessDeserializer::new(map)).map(ManifestNode::Group)
    }
}
