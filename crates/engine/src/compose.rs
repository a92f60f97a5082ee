//! # Composition state machine
//!
//! `Empty → Resolved → Flagged → Finalized → Exported`, encoded as a typestate so a
//! stage cannot be skipped or repeated. Each transition consumes the previous value;
//! on failure the scratch namespace is dropped with it and nothing is published.

use crate::error::EngineError;
use crate::export::ExportSlot;
use crate::registry::Registry;
use crate::{constants, overlay, resolver};
use carve_domain::{FeatureFlagSet, Manifest, Namespace};
use serde::{Serialize, Serializer};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info};

/// The finished, immutable output of one composition run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedNamespace {
    root: Namespace,
    flags: FeatureFlagSet,
}

impl ComposedNamespace {
    #[must_use]
    pub const fn root(&self) -> &Namespace {
        &self.root
    }

    /// The optional-subtree flags as they were evaluated for this run.
    #[must_use]
    pub const fn flags(&self) -> &FeatureFlagSet {
        &self.flags
    }

    #[must_use]
    pub fn into_inner(self) -> Namespace {
        self.root
    }
}

impl Deref for ComposedNamespace {
    type Target = Namespace;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl Serialize for ComposedNamespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

mod private {
    pub trait Sealed {}
}

/// Marker for composition stages.
pub trait Stage: private::Sealed {}

#[derive(Debug)]
pub struct Empty;
#[derive(Debug)]
pub struct Resolved;
#[derive(Debug)]
pub struct Flagged;
#[derive(Debug)]
pub struct Finalized;

impl private::Sealed for Empty {}
impl private::Sealed for Resolved {}
impl private::Sealed for Flagged {}
impl private::Sealed for Finalized {}
impl Stage for Empty {}
impl Stage for Resolved {}
impl Stage for Flagged {}
impl Stage for Finalized {}

/// One composition run against a shared, read-only [`Registry`].
#[derive(Debug)]
pub struct Composition<'r, S: Stage> {
    registry: &'r Registry,
    label: String,
    scratch: Namespace,
    flags: FeatureFlagSet,
    stage: PhantomData<S>,
}

impl<'r> Composition<'r, Empty> {
    /// Starts a run; `label` only appears in logs.
    pub fn new(registry: &'r Registry, label: impl Into<String>) -> Self {
        Self {
            registry,
            label: label.into(),
            scratch: Namespace::new(),
            flags: FeatureFlagSet::new(),
            stage: PhantomData,
        }
    }

    /// Resolves `manifest` and rejects direct requests for gated components.
    ///
    /// # Errors
    /// See [`resolver::resolve`] and [`resolver::check_gates`].
    pub fn resolve(self, manifest: &Manifest) -> Result<Composition<'r, Resolved>, EngineError> {
        let scratch = resolver::resolve(self.registry.catalog(), manifest)?;
        resolver::check_gates(&scratch, self.registry.optional())?;
        debug!(distribution = %self.label, keys = scratch.len(), "Manifest resolved");
        Ok(self.advance(scratch))
    }
}

impl<'r> Composition<'r, Resolved> {
    /// Evaluates `flags` once and grafts the enabled optional subtrees.
    ///
    /// # Errors
    /// See [`overlay::apply_flags`].
    pub fn apply_flags(mut self, flags: &FeatureFlagSet) -> Result<Composition<'r, Flagged>, EngineError> {
        let evaluated = overlay::evaluate_flags(flags, self.registry.optional());
        self.flags = evaluated.iter().fold(FeatureFlagSet::new(), |set, (flag, value)| set.with(flag, *value));

        let scratch = std::mem::take(&mut self.scratch);
        let scratch = overlay::apply_flags(scratch, &self.flags, self.registry.optional())?;
        debug!(distribution = %self.label, flags = ?self.flags, "Feature flags applied");
        Ok(self.advance(scratch))
    }
}

impl<'r> Composition<'r, Flagged> {
    /// Overlays the registry's constant table at the root.
    ///
    /// # Errors
    /// See [`constants::merge_constants`].
    pub fn merge_constants(mut self) -> Result<Composition<'r, Finalized>, EngineError> {
        let scratch = std::mem::take(&mut self.scratch);
        let scratch = constants::merge_constants(scratch, self.registry.constants())?;
        debug!(distribution = %self.label, constants = self.registry.constants().len(), "Constants merged");
        Ok(self.advance(scratch))
    }
}

impl Composition<'_, Finalized> {
    /// Hands the namespace to the caller without publishing it.
    #[must_use]
    pub fn finish(self) -> ComposedNamespace {
        let composed = ComposedNamespace { root: self.scratch, flags: self.flags };
        info!(
            distribution = %self.label,
            keys = composed.paths().len(),
            components = composed.components().len(),
            "composition finished"
        );
        composed
    }

    /// Publishes the namespace through `slot`; this is the run's only side effect.
    ///
    /// # Errors
    /// Returns [`EngineError::AlreadyExported`] if `slot` was written before.
    pub fn export(self, slot: &ExportSlot) -> Result<Arc<ComposedNamespace>, EngineError> {
        slot.publish(self.finish())
    }
}

impl<'r, S: Stage> Composition<'r, S> {
    fn advance<N: Stage>(self, scratch: Namespace) -> Composition<'r, N> {
        Composition {
            registry: self.registry,
            label: self.label,
            scratch,
            flags: self.flags,
            stage: PhantomData,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The scratch namespace as it stands at this stage.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.scratch
    }
}

/// Runs every stage and returns the finished namespace without exporting it.
///
/// # Errors
/// The first error of any stage.
pub fn compose(
    registry: &Registry,
    label: &str,
    manifest: &Manifest,
    flags: &FeatureFlagSet,
) -> Result<ComposedNamespace, EngineError> {
    Ok(Composition::new(registry, label)
        .resolve(manifest)?
        .apply_flags(flags)?
        .merge_constants()?
        .finish())
}
