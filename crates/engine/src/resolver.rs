//! # Manifest Resolver
//!
//! Walks a manifest depth-first and builds a scratch namespace containing only the
//! selected catalog entries, in manifest order. Output keys are the manifest keys;
//! leaf values are the catalog entries themselves.

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineErrorExt};
use crate::registry::OptionalSubtrees;
use carve_domain::path::validate_key;
use carve_domain::{ComponentPath, Manifest, ManifestNode, Namespace, Node, PathSelector};
use tracing::trace;

/// Resolves `manifest` against `catalog`.
///
/// # Errors
/// * [`EngineError::UnknownComponent`] for any requested leaf or subtree the catalog lacks.
/// * [`EngineError::EmptyNode`] for an empty group that is not itself a catalog leaf.
/// * [`EngineError::DuplicatePath`] if two manifest entries produce the same output key.
/// * [`EngineError::InvalidPath`] for a manifest key that is not an identifier.
pub fn resolve(catalog: &Catalog, manifest: &Manifest) -> Result<Namespace, EngineError> {
    resolve_level(catalog, manifest, &ComponentPath::root())
}

fn resolve_level(
    catalog: &Catalog,
    manifest: &Manifest,
    at: &ComponentPath,
) -> Result<Namespace, EngineError> {
    let mut out = Namespace::new();

    for (key, node) in manifest.iter() {
        validate_key(key).context(format!("manifest key under '{at}'"))?;
        let here = at.child(key);

        let resolved = match node {
            ManifestNode::Implicit => Node::Component(select_leaf(catalog, &here)?),
            ManifestNode::Select(PathSelector::Leaf(path)) => {
                Node::Component(select_leaf(catalog, path)?)
            }
            ManifestNode::Select(selector @ PathSelector::Subtree(path)) => Node::Branch(
                catalog.subtree(path).cloned().ok_or_else(|| EngineError::UnknownComponent {
                    path: selector.to_string(),
                    context: None,
                })?,
            ),
            ManifestNode::Group(group) if group.is_empty() => match catalog.lookup(&here) {
                Ok(entry) => Node::Component(entry.clone()),
                Err(_) => return Err(EngineError::EmptyNode { path: here, context: None }),
            },
            ManifestNode::Group(group) => Node::Branch(resolve_level(catalog, group, &here)?),
        };

        trace!(path = %here, "Manifest entry resolved");
        out.insert(key, resolved)
            .map_err(|_| EngineError::DuplicatePath { path: here, context: Some("manifest".into()) })?;
    }

    Ok(out)
}

fn select_leaf(
    catalog: &Catalog,
    path: &ComponentPath,
) -> Result<carve_domain::ComponentEntry, EngineError> {
    catalog
        .lookup(path)
        .cloned()
        .map_err(|_| EngineError::UnknownComponent { path: path.to_string(), context: None })
}

/// Rejects resolved components that belong to an optional subtree.
///
/// Gated content may only enter a namespace through its flag, at its attach path.
///
/// # Errors
/// Returns [`EngineError::GatedComponent`] naming the first offending output path.
pub fn check_gates(namespace: &Namespace, optional: &OptionalSubtrees) -> Result<(), EngineError> {
    if optional.is_empty() {
        return Ok(());
    }
    for (output, entry) in namespace.components() {
        if let Some(owner) = optional.owner_of(entry.path()) {
            return Err(EngineError::GatedComponent {
                path: output,
                flag: owner.flag().to_owned(),
                context: Some(format!("catalog path '{}'", entry.path()).into()),
            });
        }
    }
    Ok(())
}
