//! # Distribution Packager
//!
//! Consumes a finished [`ComposedNamespace`](carve_engine::ComposedNamespace) and emits
//! named artifacts:
//!
//! * `<name>.js`: CommonJS entry module exporting the namespace once and publishing it
//!   once under the global binding.
//! * `<name>.min.js`: the same module without insignificant whitespace.
//! * `<name>.js.map.json`: line/column of every key in `<name>.js`.
//! * `<name>.surface.json`: every dotted key path the module exports.
//!
//! [`ArtifactWriter`] stores them atomically (temp file, `fsync`, rename).

mod artifact;
mod emit;
mod error;
mod maintenance;
mod writer;

pub use crate::artifact::{Artifact, ArtifactKind};
pub use crate::emit::{EntryPackager, PackageOptions, Packager, Position};
pub use crate::error::{PackagerError, PackagerErrorExt};
pub use crate::writer::{ArtifactWriter, DEFAULT_STALE_AFTER, WriterInner};
