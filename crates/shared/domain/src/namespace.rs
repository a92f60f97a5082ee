//! The ordered namespace tree produced by composition.

use crate::constants::ConstValue;
use crate::path::ComponentPath;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A registered unit of functionality: its catalog path plus an opaque module specifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentEntry {
    path: ComponentPath,
    module: Arc<str>,
}

impl ComponentEntry {
    pub fn new(path: ComponentPath, module: impl Into<Arc<str>>) -> Self {
        Self { path, module: module.into() }
    }

    /// Catalog position this entry was registered at.
    #[must_use]
    pub const fn path(&self) -> &ComponentPath {
        &self.path
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(Namespace),
    Component(ComponentEntry),
    Constant(ConstValue),
}

impl Node {
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    #[must_use]
    pub const fn as_branch(&self) -> Option<&Namespace> {
        match self {
            Self::Branch(ns) => Some(ns),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_component(&self) -> Option<&ComponentEntry> {
        match self {
            Self::Component(entry) => Some(entry),
            _ => None,
        }
    }
}

/// An insertion-ordered tree of named nodes. Keys are unique per level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: Vec<(Arc<str>, Node)>,
}

impl Namespace {
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing.as_ref() == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Appends `node` under `key`. Returns the node back if the key is taken.
    ///
    /// # Errors
    /// Returns `Err(node)` when `key` already exists at this level.
    pub fn insert(&mut self, key: &str, node: Node) -> Result<(), Node> {
        if self.contains_key(key) {
            return Err(node);
        }
        self.entries.push((Arc::from(key), node));
        Ok(())
    }

    /// Returns the child branch at `key`, creating an empty one if absent.
    ///
    /// Returns `None` when `key` already holds a leaf.
    pub fn branch_mut(&mut self, key: &str) -> Option<&mut Self> {
        let index = match self.position(key) {
            Some(i) => i,
            None => {
                self.entries.push((Arc::from(key), Node::Branch(Self::new())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[index].1 {
            Node::Branch(ns) => Some(ns),
            _ => None,
        }
    }

    /// Follows `path` from this level.
    #[must_use]
    pub fn lookup(&self, path: &ComponentPath) -> Option<&Node> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.get(segment)?.as_branch()?;
        }
        current.get(last)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_ref(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visits every node depth-first in insertion order, parents before children.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&ComponentPath, &Node),
    {
        self.walk_from(&ComponentPath::root(), &mut visit);
    }

    fn walk_from<F>(&self, prefix: &ComponentPath, visit: &mut F)
    where
        F: FnMut(&ComponentPath, &Node),
    {
        for (key, node) in &self.entries {
            let path = prefix.child(key);
            visit(&path, node);
            if let Node::Branch(child) = node {
                child.walk_from(&path, visit);
            }
        }
    }

    /// Every reachable key path, in traversal order.
    #[must_use]
    pub fn paths(&self) -> Vec<ComponentPath> {
        let mut out = Vec::new();
        self.walk(|path, _| out.push(path.clone()));
        out
    }

    /// Every component leaf with its output position.
    #[must_use]
    pub fn components(&self) -> Vec<(ComponentPath, &ComponentEntry)> {
        let mut out = Vec::new();
        collect_components(self, &ComponentPath::root(), &mut out);
        out
    }
}

fn collect_components<'a>(
    ns: &'a Namespace,
    prefix: &ComponentPath,
    out: &mut Vec<(ComponentPath, &'a ComponentEntry)>,
) {
    for (key, node) in &ns.entries {
        match node {
            Node::Component(entry) => out.push((prefix.child(key), entry)),
            Node::Branch(child) => collect_components(child, &prefix.child(key), out),
            Node::Constant(_) => {}
        }
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key.as_ref(), node)?;
        }
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Branch(ns) => ns.serialize(serializer),
            Self::Component(entry) => serializer.serialize_str(entry.module()),
            Self::Constant(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, module: &str) -> Node {
        Node::Component(ComponentEntry::new(ComponentPath::parse(path).unwrap(), module))
    }

    fn sample() -> Namespace {
        let mut root = Namespace::new();
        let game_objects = root.branch_mut("GameObjects").unwrap();
        game_objects.insert("Sprite", entry("GameObjects.Sprite", "gameobjects/sprite/Sprite")).unwrap();
        game_objects.insert("Image", entry("GameObjects.Image", "gameobjects/image/Image")).unwrap();
        root.insert("Game", entry("Game", "core/Game")).unwrap();
        root.insert("AUTO", Node::Constant(ConstValue::Int(0))).unwrap();
        root
    }

    #[test]
    fn insert_refuses_existing_keys() {
        let mut ns = sample();
        assert!(ns.insert("Game", Node::Constant(ConstValue::Int(1))).is_err());
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn branch_mut_refuses_leaves() {
        let mut ns = sample();
        assert!(ns.branch_mut("Game").is_none());
        assert!(ns.branch_mut("GameObjects").is_some());
    }

    #[test]
    fn lookup_follows_nested_paths() {
        let ns = sample();
        let node = ns.lookup(&ComponentPath::parse("GameObjects.Image").unwrap()).unwrap();
        assert_eq!(node.as_component().unwrap().module(), "gameobjects/image/Image");
        assert!(ns.lookup(&ComponentPath::parse("Game.Image").unwrap()).is_none());
    }

    #[test]
    fn traversal_keeps_insertion_order() {
        let paths: Vec<String> = sample().paths().iter().map(ToString::to_string).collect();
        assert_eq!(
            paths,
            ["GameObjects", "GameObjects.Sprite", "GameObjects.Image", "Game", "AUTO"]
        );
    }

    #[test]
    fn serializes_as_ordered_object() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"GameObjects":{"Sprite":"gameobjects/sprite/Sprite","Image":"gameobjects/image/Image"},"Game":"core/Game","AUTO":0}"#
        );
    }
}
