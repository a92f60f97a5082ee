//! The declarative catalog document: every available component, the flag-gated
//! optional subtrees and the engine-wide constants.

use crate::constants::ConstantTable;
use crate::ordered::OrderedMap;
use crate::path::{ComponentPath, PathSelector};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredNode {
    /// A leaf, holding the module specifier that implements it.
    Module(Arc<str>),
    Group(DeclaredTree),
}

/// Ordered tree of declared components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredTree {
    entries: Vec<(String, DeclaredNode)>,
}

impl DeclaredTree {
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: DeclaredNode) -> Self {
        self.entries.push((key.into(), node));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeclaredNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens the tree into `(key segments, module)` pairs, depth-first.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Vec<&str>, &str)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_leaves(self, &mut prefix, &mut out);
        out
    }
}

fn collect_leaves<'a>(
    tree: &'a DeclaredTree,
    prefix: &mut Vec<&'a str>,
    out: &mut Vec<(Vec<&'a str>, &'a str)>,
) {
    for (key, node) in &tree.entries {
        prefix.push(key.as_str());
        match node {
            DeclaredNode::Module(module) => out.push((prefix.clone(), &**module)),
            DeclaredNode::Group(child) => collect_leaves(child, prefix, out),
        }
        prefix.pop();
    }
}

impl<'de> Deserialize<'de> for DeclaredTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let OrderedMap(entries) = OrderedMap::deserialize(deserializer)?;
        Ok(Self { entries })
    }
}

impl<'de> Deserialize<'de> for DeclaredNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DeclaredNodeVisitor)
    }
}

struct DeclaredNodeVisitor;

impl<'de> Visitor<'de> for DeclaredNodeVisitor {
    type Value = DeclaredNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a module specifier string or a nested object")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            return Err(E::invalid_value(de::Unexpected::Str(v), &"a non-empty module specifier"));
        }
        Ok(DeclaredNode::Module(Arc::from(v)))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        DeclaredTree::deserialize(de::value::MapAccessDeserializer::new(map)).map(DeclaredNode::Group)
    }
}

/// A subtree included only when `flag` evaluates to true.
///
/// `source` selects catalog content; it is grafted onto the composed namespace at `attach`.
/// A subtree selector grafts the children of the selected node, a leaf selector grafts the leaf itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OptionalSubtree {
    pub flag: String,
    pub attach: ComponentPath,
    pub source: PathSelector,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogDocument {
    pub name: String,
    pub version: String,
    pub components: DeclaredTree,
    #[serde(default)]
    pub optional: Vec<OptionalSubtree>,
    #[serde(default)]
    pub constants: ConstantTable,
}
