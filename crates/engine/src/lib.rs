//! # Composition Engine
//!
//! Assembles reduced-footprint distributions of a modular framework from a static
//! component catalog.
//!
//! ## Pipeline
//!
//! 1.  **Catalog ([`catalog`])**: every available component, addressed by a dotted path.
//! 2.  **Resolver ([`resolver`])**: keeps only what a manifest asks for, in manifest order.
//! 3.  **Overlay ([`overlay`])**: grafts flag-gated optional subtrees, or leaves them out entirely.
//! 4.  **Constant merge ([`constants`])**: adds engine-wide scalars at the root, never overwriting.
//! 5.  **Export ([`export`])**: publishes the result once under the global binding.
//!
//! [`compose::Composition`] ties the stages together as a typestate. A [`Registry`] is
//! built once and can be shared by any number of concurrent runs; each run owns its
//! scratch namespace.
//!
//! ```rust
//! use carve_domain::{CatalogDocument, FeatureFlagSet, Manifest};
//! use carve_engine::{ExportSlot, Registry, compose::Composition};
//!
//! let document: CatalogDocument = serde_json::from_str(
//!     r#"{"name":"demo","version":"1","components":{"A":{"B":"a/b","C":"a/c"},"D":"d"}}"#,
//! ).unwrap();
//! let registry = Registry::from_document(&document).unwrap();
//! let manifest: Manifest = serde_json::from_str(r#"{"A":{"B":true}}"#).unwrap();
//!
//! let slot = ExportSlot::new("Demo");
//! let exported = Composition::new(&registry, "demo")
//!     .resolve(&manifest).unwrap()
//!     .apply_flags(&FeatureFlagSet::new()).unwrap()
//!     .merge_constants().unwrap()
//!     .export(&slot).unwrap();
//! assert_eq!(serde_json::to_string(&*exported).unwrap(), r#"{"A":{"B":"a/b"}}"#);
//! ```

pub mod catalog;
pub mod compose;
pub mod constants;
mod error;
pub mod export;
pub mod overlay;
pub mod registry;
pub mod resolver;

pub use crate::catalog::Catalog;
pub use crate::compose::{ComposedNamespace, Composition, compose};
pub use crate::error::{EngineError, EngineErrorExt};
pub use crate::export::ExportSlot;
pub use crate::registry::{GatedSubtree, OptionalSubtrees, Registry};
