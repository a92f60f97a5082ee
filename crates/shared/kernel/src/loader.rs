//! JSON loaders for catalog documents and manifests.

use crate::error::{LoadError, LoadErrorExt};
use carve_domain::{CatalogDocument, Manifest};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Reads and decodes a catalog document.
///
/// # Errors
/// [`LoadError::Io`] if the file cannot be read, [`LoadError::Json`] if it is malformed
/// (including duplicate keys within one object).
pub fn load_catalog_document(path: impl AsRef<Path>) -> Result<CatalogDocument, LoadError> {
    let document: CatalogDocument = read_json(path.as_ref())?;
    debug!(
        path = %path.as_ref().display(),
        name = %document.name,
        version = %document.version,
        "Catalog document loaded"
    );
    Ok(document)
}

/// Reads and decodes a build manifest.
///
/// # Errors
/// See [`load_catalog_document`].
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest, LoadError> {
    let manifest: Manifest = read_json(path.as_ref())?;
    debug!(path = %path.as_ref().display(), entries = manifest.len(), "Manifest loaded");
    Ok(manifest)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).context(format!("Failed to decode {}", path.display()))
}
