//! Kernel utilities shared across crates.
//! Keep this crate lightweight: layered config loading and JSON document loaders.
//!
//! ## Config loading
//! ```rust,ignore
//! use carve_kernel::config::load_config;
//! let cfg: carve_kernel::domain::config::CarveConfig = load_config(Some("carve.toml")).unwrap();
//! ```
pub mod config;
mod error;
pub mod loader;

pub use carve_domain as domain;
pub use error::{LoadError, LoadErrorExt};
pub use loader::{load_catalog_document, load_manifest};
