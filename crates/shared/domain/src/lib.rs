//! # Domain Models
//!
//! Pure data types for catalogs, manifests and composed namespaces, with minimal
//! dependencies (`serde`, `bitflags`). Keep it lean: no I/O and no composition
//! logic, only data and the invariants a value can check on its own.

pub mod config;
pub mod constants;
pub mod document;
pub mod flags;
pub mod manifest;
pub mod namespace;
pub mod path;

mod ordered;

pub use constants::{ConstValue, ConstantTable};
pub use document::{CatalogDocument, DeclaredNode, DeclaredTree, OptionalSubtree};
pub use flags::{BuildFlags, FeatureFlagSet};
pub use manifest::{Manifest, ManifestNode};
pub use namespace::{ComponentEntry, Namespace, Node};
pub use path::{ComponentPath, InvalidPath, PathSelector};
