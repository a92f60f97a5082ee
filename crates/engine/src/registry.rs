//! The immutable bundle every composition run reads from: the catalog, the
//! flag-gated optional subtrees and the constant table.

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineErrorExt};
use carve_domain::path::validate_key;
use carve_domain::{
    CatalogDocument, ComponentEntry, ComponentPath, ConstantTable, Namespace, Node, OptionalSubtree,
    PathSelector,
};
use tracing::{debug, info};

/// One optional subtree with its catalog content captured at registration time.
#[derive(Debug, Clone)]
pub struct GatedSubtree {
    flag: String,
    attach: ComponentPath,
    selector: PathSelector,
    content: Node,
}

impl GatedSubtree {
    /// Resolves `declared.source` against `catalog`.
    ///
    /// # Errors
    /// [`EngineError::NotFound`] if the source does not exist in the catalog with the declared shape.
    pub fn from_declaration(catalog: &Catalog, declared: &OptionalSubtree) -> Result<Self, EngineError> {
        let content = match &declared.source {
            PathSelector::Leaf(path) => Node::Component(catalog.lookup(path)?.clone()),
            PathSelector::Subtree(path) => Node::Branch(
                catalog
                    .subtree(path)
                    .cloned()
                    .ok_or_else(|| EngineError::NotFound { path: path.clone(), context: None })?,
            ),
        };
        Ok(Self {
            flag: declared.flag.to_ascii_uppercase(),
            attach: declared.attach.clone(),
            selector: declared.source.clone(),
            content,
        })
    }

    #[must_use]
    pub fn flag(&self) -> &str {
        &self.flag
    }

    #[must_use]
    pub const fn attach(&self) -> &ComponentPath {
        &self.attach
    }

    #[must_use]
    pub const fn selector(&self) -> &PathSelector {
        &self.selector
    }

    /// Grafted as-is: a branch for subtree selectors, a component for leaf selectors.
    #[must_use]
    pub const fn content(&self) -> &Node {
        &self.content
    }
}

/// The static optional-subtree table.
#[derive(Debug, Clone, Default)]
pub struct OptionalSubtrees(Vec<GatedSubtree>);

impl OptionalSubtrees {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, subtree: GatedSubtree) {
        self.0.push(subtree);
    }

    pub fn iter(&self) -> impl Iterator<Item = &GatedSubtree> {
        self.0.iter()
    }

    /// Distinct flag names in declaration order.
    #[must_use]
    pub fn flags(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for subtree in &self.0 {
            if !out.contains(&subtree.flag()) {
                out.push(subtree.flag());
            }
        }
        out
    }

    /// The subtree owning the catalog leaf at `path`, if it is gated.
    #[must_use]
    pub fn owner_of(&self, path: &ComponentPath) -> Option<&GatedSubtree> {
        self.0.iter().find(|subtree| subtree.selector.covers(path))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A read-only catalog plus everything a composition run needs besides the manifest and flags.
///
/// Share it between concurrent runs behind an `Arc`; no method takes `&mut self`.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    version: String,
    catalog: Catalog,
    optional: OptionalSubtrees,
    constants: ConstantTable,
}

impl Registry {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        catalog: Catalog,
        optional: OptionalSubtrees,
        constants: ConstantTable,
    ) -> Self {
        Self { name: name.into(), version: version.into(), catalog, optional, constants }
    }

    /// Registers every declared component, then captures optional subtrees and constants.
    ///
    /// # Errors
    /// Any registration error ([`EngineError::DuplicatePath`], [`EngineError::AmbiguousNode`],
    /// [`EngineError::InvalidPath`]), [`EngineError::NotFound`] for an optional subtree whose
    /// source is missing, and [`EngineError::InvalidPath`] for a constant name that is not an identifier.
    pub fn from_document(document: &CatalogDocument) -> Result<Self, EngineError> {
        let mut catalog = Catalog::new();
        for (segments, module) in document.components.leaves() {
            let path = ComponentPath::from_segments(&segments)
                .context(format!("component '{}'", segments.join(".")))?;
            catalog.register(path, module)?;
        }

        let mut optional = OptionalSubtrees::new();
        for declared in &document.optional {
            let subtree = GatedSubtree::from_declaration(&catalog, declared)
                .context(format!("optional subtree for flag {}", declared.flag))?;
            debug!(flag = %subtree.flag(), attach = %subtree.attach(), source = %subtree.selector(), "Optional subtree declared");
            optional.push(subtree);
        }

        for (name, _) in document.constants.iter() {
            validate_key(name).context("constant name")?;
        }

        info!(
            catalog = %document.name,
            version = %document.version,
            components = catalog.len(),
            optional = optional.flags().len(),
            constants = document.constants.len(),
            "Catalog registered"
        );

        Ok(Self::new(
            document.name.clone(),
            document.version.clone(),
            catalog,
            optional,
            document.constants.clone(),
        ))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn optional(&self) -> &OptionalSubtrees {
        &self.optional
    }

    #[must_use]
    pub const fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    /// Catalog leaves, optionally restricted to those under `prefix`.
    #[must_use]
    pub fn leaves_under(&self, prefix: Option<&ComponentPath>) -> Vec<&ComponentEntry> {
        self.catalog
            .entries()
            .into_iter()
            .filter(|entry| prefix.is_none_or(|p| entry.path().starts_with(p)))
            .collect()
    }

    /// The complete catalog tree, regardless of gating.
    #[must_use]
    pub const fn tree(&self) -> &Namespace {
        self.catalog.tree()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(raw: &str) -> CatalogDocument {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn builds_registry_from_document() {
        let registry = Registry::from_document(&document(
            r#"{
                "name": "demo", "version": "1.0.0",
                "components": { "Game": "core/Game", "Sound": { "Base": "sound/Base", "Web": "sound/Web" } },
                "optional": [
                    { "flag": "feature_sound", "attach": "Sound", "source": "Sound.*" },
                    { "flag": "FEATURE_SOUND", "attach": "Audio", "source": "Sound.Web" }
                ],
                "constants": { "AUTO": 0 }
            }"#,
        ))
        .unwrap();

        assert_eq!(registry.catalog().len(), 3);
        assert_eq!(registry.optional().flags(), ["FEATURE_SOUND"]);

        let web = ComponentPath::parse("Sound.Web").unwrap();
        assert_eq!(registry.optional().owner_of(&web).unwrap().attach().to_string(), "Sound");
        assert!(registry.optional().owner_of(&ComponentPath::parse("Game").unwrap()).is_none());

        let sound = ComponentPath::parse("Sound").unwrap();
        assert_eq!(registry.leaves_under(Some(&sound)).len(), 2);
        assert_eq!(registry.leaves_under(None).len(), 3);
    }

    #[test]
    fn optional_source_must_exist() {
        let err = Registry::from_document(&document(
            r#"{ "name": "x", "version": "1", "components": { "A": "a" },
                 "optional": [ { "flag": "F", "attach": "B", "source": "B.*" } ] }"#,
        ))
        .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        assert!(err.to_string().contains("optional subtree for flag F"));
    }

    #[test]
    fn rejects_invalid_component_keys_and_constant_names() {
        let bad_key = Registry::from_document(&document(
            r#"{ "name": "x", "version": "1", "components": { "2D": "a" } }"#,
        ))
        .unwrap_err();
        assert_eq!(bad_key.kind(), "InvalidPath");

        let bad_constant = Registry::from_document(&document(
            r#"{ "name": "x", "version": "1", "components": { "A": "a" }, "constants": { "not ok": 1 } }"#,
        ))
        .unwrap_err();
        assert_eq!(bad_constant.kind(), "InvalidPath");
    }
}
