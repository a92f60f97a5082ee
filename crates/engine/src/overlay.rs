//! # Feature-Flag Overlay
//!
//! Grafts optional subtrees onto a resolved namespace. Flags are evaluated once,
//! up front; a disabled subtree leaves nothing behind, not even an empty node at
//! its attach path.

use crate::error::EngineError;
use crate::registry::{GatedSubtree, OptionalSubtrees};
use carve_domain::{ComponentPath, FeatureFlagSet, Namespace, Node};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Flag values frozen for one run. Flags the set does not mention read as `false`.
#[must_use]
pub fn evaluate_flags(flags: &FeatureFlagSet, optional: &OptionalSubtrees) -> BTreeMap<String, bool> {
    optional
        .flags()
        .into_iter()
        .map(|flag| {
            let value = flags.get(flag).unwrap_or_else(|| {
                warn!(flag, "Flag not set for this build, treating as disabled");
                false
            });
            (flag.to_owned(), value)
        })
        .collect()
}

/// Grafts every enabled optional subtree onto `namespace`.
///
/// # Errors
/// Returns [`EngineError::AttachConflict`] when a graft would replace or descend into a leaf.
pub fn apply_flags(
    mut namespace: Namespace,
    flags: &FeatureFlagSet,
    optional: &OptionalSubtrees,
) -> Result<Namespace, EngineError> {
    let evaluated = evaluate_flags(flags, optional);

    for subtree in optional.iter() {
        let enabled = evaluated.get(subtree.flag()).copied().unwrap_or(false);
        if enabled {
            graft(&mut namespace, subtree)?;
            debug!(flag = %subtree.flag(), attach = %subtree.attach(), "Optional subtree grafted");
        } else {
            debug!(flag = %subtree.flag(), attach = %subtree.attach(), "Optional subtree excluded");
        }
    }

    Ok(namespace)
}

fn graft(namespace: &mut Namespace, subtree: &GatedSubtree) -> Result<(), EngineError> {
    let attach = subtree.attach();
    let conflict = |path: ComponentPath| EngineError::AttachConflict {
        path,
        context: Some(format!("grafting {} for {}", subtree.selector(), subtree.flag()).into()),
    };

    match subtree.content() {
        Node::Branch(children) => {
            let target = descend(namespace, attach.segments()).map_err(conflict)?;
            merge(target, children, attach).map_err(conflict)
        }
        leaf => {
            let Some((last, parents)) = attach.segments().split_last() else {
                return Err(conflict(ComponentPath::root()));
            };
            let parent = descend(namespace, parents).map_err(conflict)?;
            parent.insert(last, leaf.clone()).map_err(|_| conflict(attach.clone()))
        }
    }
}

/// Walks to (creating as needed) the branch at `segments`. On failure returns the leaf's path.
fn descend<'a>(
    namespace: &'a mut Namespace,
    segments: &[std::sync::Arc<str>],
) -> Result<&'a mut Namespace, ComponentPath> {
    let mut level = namespace;
    let mut walked = ComponentPath::root();
    for segment in segments {
        walked = walked.child(segment);
        level = level.branch_mut(segment).ok_or_else(|| walked.clone())?;
    }
    Ok(level)
}

/// Merges `source` into `target` recursively; branches combine, anything else must be new.
fn merge(target: &mut Namespace, source: &Namespace, at: &ComponentPath) -> Result<(), ComponentPath> {
    for (key, node) in source.iter() {
        let here = at.child(key);
        match node {
            Node::Branch(children) if target.get(key).is_none_or(Node::is_branch) => {
                let branch = target.branch_mut(key).ok_or_else(|| here.clone())?;
                merge(branch, children, &here)?;
            }
            _ => target.insert(key, node.clone()).map_err(|_| here)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use carve_domain::{OptionalSubtree, PathSelector};

    fn path(raw: &str) -> ComponentPath {
        ComponentPath::parse(raw).unwrap()
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (p, m) in [
            ("Game", "core/Game"),
            ("Sound.BaseSound", "sound/BaseSound"),
            ("Sound.WebAudio.Manager", "sound/webaudio/Manager"),
            ("Renderer.WebGL", "renderer/webgl"),
        ] {
            catalog.register(path(p), m).unwrap();
        }
        catalog
    }

    fn optional(entries: &[(&str, &str, &str)]) -> OptionalSubtrees {
        let catalog = catalog();
        let mut out = OptionalSubtrees::new();
        for (flag, attach, source) in entries {
            let declared = OptionalSubtree {
                flag: (*flag).to_owned(),
                attach: path(attach),
                source: PathSelector::parse(source).unwrap(),
            };
            out.push(GatedSubtree::from_declaration(&catalog, &declared).unwrap());
        }
        out
    }

    fn base() -> Namespace {
        let mut ns = Namespace::new();
        ns.insert("Game", Node::Component(catalog().lookup(&path("Game")).unwrap().clone())).unwrap();
        ns
    }

    #[test]
    fn disabled_flag_leaves_no_trace() {
        let table = optional(&[("FEATURE_SOUND", "Sound", "Sound.*")]);
        let flags = FeatureFlagSet::new().with("FEATURE_SOUND", false);

        let ns = apply_flags(base(), &flags, &table).unwrap();
        assert_eq!(ns.keys().collect::<Vec<_>>(), ["Game"]);
    }

    #[test]
    fn missing_flag_counts_as_disabled() {
        let table = optional(&[("FEATURE_SOUND", "Sound", "Sound.*")]);
        let evaluated = evaluate_flags(&FeatureFlagSet::new(), &table);
        assert_eq!(evaluated.get("FEATURE_SOUND"), Some(&false));
        assert!(apply_flags(base(), &FeatureFlagSet::new(), &table).unwrap().get("Sound").is_none());
    }

    #[test]
    fn enabled_subtree_lands_at_attach_path() {
        let table = optional(&[("FEATURE_SOUND", "Audio.Backends", "Sound.*")]);
        let flags = FeatureFlagSet::new().with("feature_sound", true);

        let ns = apply_flags(base(), &flags, &table).unwrap();
        let paths: Vec<String> = ns.paths().iter().map(ToString::to_string).collect();
        assert_eq!(
            paths,
            [
                "Game",
                "Audio",
                "Audio.Backends",
                "Audio.Backends.BaseSound",
                "Audio.Backends.WebAudio",
                "Audio.Backends.WebAudio.Manager",
            ]
        );
    }

    #[test]
    fn leaf_graft_and_branch_merge() {
        let table = optional(&[("WEBGL_RENDERER", "Renderer.WebGL", "Renderer.WebGL")]);
        let mut ns = base();
        ns.branch_mut("Renderer")
            .unwrap()
            .insert("Snapshot", Node::Component(catalog().lookup(&path("Game")).unwrap().clone()))
            .unwrap();

        let ns = apply_flags(ns, &FeatureFlagSet::new().with("WEBGL_RENDERER", true), &table).unwrap();
        let renderer = ns.get("Renderer").and_then(Node::as_branch).unwrap();
        assert_eq!(renderer.keys().collect::<Vec<_>>(), ["Snapshot", "WebGL"]);
    }

    #[test]
    fn grafting_over_a_leaf_is_an_attach_conflict() {
        let table = optional(&[("FEATURE_SOUND", "Game", "Sound.*")]);
        let err = apply_flags(base(), &FeatureFlagSet::new().with("FEATURE_SOUND", true), &table)
            .unwrap_err();
        assert!(matches!(err, EngineError::AttachConflict { ref path, .. } if path.to_string() == "Game"));

        let below = optional(&[("FEATURE_SOUND", "Game.Sound", "Sound.*")]);
        let err = apply_flags(base(), &FeatureFlagSet::new().with("FEATURE_SOUND", true), &below)
            .unwrap_err();
        assert_eq!(err.kind(), "AttachConflict");
    }
}
