//! Facade crate for Carve.
//! Re-exports the domain, kernel, engine and packager crates and wires them into the
//! end-to-end pipeline: load a [`Project`], then compose, package and write its
//! distributions.
//! Keep this crate thin: it composes other crates, it does not implement composition rules.
//!
//! ## Usage
//! ```rust,no_run
//! # async fn run() -> Result<(), carve::CarveError> {
//! use carve::{BuildOverrides, Project};
//!
//! let project = Project::load("carve.toml")?;
//! let overrides = BuildOverrides::default().disable("FEATURE_SOUND");
//! let _reports = project.build_all(&[], &overrides).await?;
//! # Ok(()) }
//! ```

mod error;
mod project;

pub use carve_domain as domain;
pub use carve_engine as engine;
pub use carve_kernel as kernel;
pub use carve_packager as packager;

pub use crate::error::{CarveError, CarveErrorExt};
pub use crate::project::{BuildOverrides, BuildReport, Project};
