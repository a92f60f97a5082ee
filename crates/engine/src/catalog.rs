//! # Component Catalog
//!
//! The source of truth for what exists. Every leaf is registered once, during a
//! single-threaded initialization phase; afterwards the catalog is only read.
//! A path is either an internal node or a leaf, never both.

use crate::error::EngineError;
use carve_domain::{ComponentEntry, ComponentPath, InvalidPath, Namespace, Node};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tree: Namespace,
    leaves: usize,
}

impl Catalog {
    #[must_use]
    pub const fn new() -> Self {
        Self { tree: Namespace::new(), leaves: 0 }
    }

    /// Registers a component at `path`.
    ///
    /// Nothing is modified when registration fails.
    ///
    /// # Errors
    /// * [`EngineError::DuplicatePath`] if `path` is already a leaf.
    /// * [`EngineError::AmbiguousNode`] if `path` runs through an existing leaf, or existing
    ///   leaves live underneath `path`.
    /// * [`EngineError::InvalidPath`] for the empty (root) path.
    pub fn register(
        &mut self,
        path: ComponentPath,
        module: impl Into<Arc<str>>,
    ) -> Result<(), EngineError> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(InvalidPath { input: String::new(), reason: "cannot register the root" }.into());
        };

        // Conflicts are detected on existing nodes only, so a failure never leaves new branches behind.
        let mut level = &mut self.tree;
        for (depth, segment) in parents.iter().enumerate() {
            if let Some(Node::Component(existing)) = level.get(segment) {
                let context = format!("'{segment}' at depth {depth} is a leaf");
                return Err(EngineError::AmbiguousNode {
                    conflict: existing.path().clone(),
                    path,
                    context: Some(context.into()),
                });
            }
            let Some(next) = level.branch_mut(segment) else {
                return Err(EngineError::Internal {
                    message: format!("'{segment}' is neither a branch nor a leaf").into(),
                    context: None,
                });
            };
            level = next;
        }

        match level.get(last) {
            Some(Node::Component(_)) => Err(EngineError::DuplicatePath { path, context: None }),
            Some(Node::Branch(children)) => {
                let conflict = first_leaf(children)
                    .map_or_else(|| path.clone(), |entry| entry.path().clone());
                Err(EngineError::AmbiguousNode { path, conflict, context: None })
            }
            Some(Node::Constant(_)) | None => {
                let entry = ComponentEntry::new(path.clone(), module);
                level
                    .insert(last, Node::Component(entry))
                    .map_err(|_| EngineError::DuplicatePath { path, context: None })?;
                self.leaves += 1;
                Ok(())
            }
        }
    }

    /// Returns the leaf registered at `path`.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] if `path` is absent or names an internal node.
    pub fn lookup(&self, path: &ComponentPath) -> Result<&ComponentEntry, EngineError> {
        self.tree
            .lookup(path)
            .and_then(Node::as_component)
            .ok_or_else(|| EngineError::NotFound { path: path.clone(), context: None })
    }

    /// Returns the internal node at `path`, if any.
    #[must_use]
    pub fn subtree(&self, path: &ComponentPath) -> Option<&Namespace> {
        self.tree.lookup(path).and_then(Node::as_branch)
    }

    /// The whole catalog as a namespace tree, in registration order.
    #[must_use]
    pub const fn tree(&self) -> &Namespace {
        &self.tree
    }

    /// Every registered leaf in registration order.
    #[must_use]
    pub fn entries(&self) -> Vec<&ComponentEntry> {
        self.tree.components().into_iter().map(|(_, entry)| entry).collect()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.leaves
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.leaves == 0
    }
}

fn first_leaf(ns: &Namespace) -> Option<&ComponentEntry> {
    ns.iter().find_map(|(_, node)| match node {
        Node::Component(entry) => Some(entry),
        Node::Branch(child) => first_leaf(child),
        Node::Constant(_) => None,
    })
}
