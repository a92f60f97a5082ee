//! Atomic artifact writes into a single output directory.

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::{PackagerError, PackagerErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Temp files younger than this may belong to a concurrent writer and are left alone.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct WriterInner {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

/// Writes artifacts so that a target file is either the old or the new version, never partial.
///
/// Cheap to clone; clones share the temp-name counter.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    inner: Arc<WriterInner>,
}

impl Deref for ArtifactWriter {
    type Target = WriterInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ArtifactWriter {
    /// Creates `dir` if needed and purges stale temp files from earlier runs.
    ///
    /// # Errors
    /// Returns [`PackagerError::Io`] if the directory cannot be created or resolved.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, PackagerError> {
        Self::open_with(dir, DEFAULT_STALE_AFTER).await
    }

    /// Like [`ArtifactWriter::open`], purging temp files older than `stale_after`.
    ///
    /// # Errors
    /// See [`ArtifactWriter::open`].
    pub async fn open_with(dir: impl AsRef<Path>, stale_after: Duration) -> Result<Self, PackagerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .context(format!("Failed to create output directory: {}", dir.display()))?;
        let root = fs::canonicalize(dir)
            .await
            .context(format!("Failed to resolve output directory: {}", dir.display()))?;

        maintenance::purge_tmp(&root, stale_after).await;
        debug!(root = %root.display(), "Artifact writer ready");

        Ok(Self { inner: Arc::new(WriterInner { root, tmp_counter: AtomicU64::new(0) }) })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one artifact atomically and returns its final path.
    ///
    /// 1. Data goes to a unique temp file (`<name>.carvetmp.<n>`) created exclusively.
    /// 2. The temp file is synced to disk.
    /// 3. It is renamed over the target; the directory entry is synced.
    ///
    /// # Errors
    /// * [`PackagerError::InvalidArtifactName`] if the name is empty, hidden, contains a path
    ///   separator or `..`, or looks like a temp file.
    /// * [`PackagerError::Io`] for any filesystem failure; the temp file is removed.
    pub async fn write(&self, artifact: &Artifact) -> Result<PathBuf, PackagerError> {
        validate_name(artifact.name())?;
        let target = self.root.join(artifact.name());
        let temp = TempFile::new(self.unique_tmp_path(artifact.name()));

        Self::write_temp(temp.path(), artifact.contents().as_bytes()).await?;

        if let Err(err) = fs::rename(temp.path(), &target).await {
            if err.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(PackagerError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.path().display(), target.display())
                            .into(),
                    ),
                });
            }
            fs::remove_file(&target)
                .await
                .context(format!("Failed to replace existing file: {}", target.display()))?;
            fs::rename(temp.path(), &target).await.context(format!(
                "Atomic swap failed: {} -> {}",
                temp.path().display(),
                target.display()
            ))?;
        }
        temp.persisted();

        Self::sync_dir(&self.root).await;
        debug!(path = %target.display(), kind = %artifact.kind(), bytes = artifact.len(), "Artifact written");
        Ok(target)
    }

    /// Writes artifacts in order, stopping at the first failure.
    ///
    /// # Errors
    /// See [`ArtifactWriter::write`].
    pub async fn write_all(&self, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, PackagerError> {
        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            written.push(self.write(artifact).await?);
        }
        Ok(written)
    }

    /// Removes `<distribution><suffix>` files of every kind missing from `kept`.
    ///
    /// Returns the removed paths. Absent files are not an error.
    ///
    /// # Errors
    /// * [`PackagerError::InvalidArtifactName`] if `distribution` is not a valid file stem.
    /// * [`PackagerError::Io`] if an existing file cannot be removed.
    pub async fn remove_stale(&self, distribution: &str, kept: &[ArtifactKind]) -> Result<Vec<PathBuf>, PackagerError> {
        let mut removed = Vec::new();
        for kind in ArtifactKind::ALL.into_iter().filter(|kind| !kept.contains(kind)) {
            let name = format!("{distribution}{}", kind.suffix());
            validate_name(&name)?;
            let path = self.root.join(&name);
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), %kind, "Stale artifact removed");
                    removed.push(path);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(PackagerError::Io {
                        source: err,
                        context: Some(format!("Failed to remove stale artifact: {}", path.display()).into()),
                    });
                }
            }
        }
        if !removed.is_empty() {
            Self::sync_dir(&self.root).await;
        }
        Ok(removed)
    }

    /// Removes orphaned temp files older than `older_than`; returns how many were removed.
    pub async fn purge_tmp(&self, older_than: Duration) -> usize {
        maintenance::purge_tmp(&self.root, older_than).await
    }

    async fn write_temp(temp: &Path, data: &[u8]) -> Result<(), PackagerError> {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(temp)
            .await
            .context(format!("Temp creation failed: {}", temp.display()))?;
        file.write_all(data).await.context("Write failed")?;
        file.sync_all().await.context("Hardware sync failed")?;
        Ok(())
    }

    fn unique_tmp_path(&self, name: &str) -> PathBuf {
        let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{name}{TMP_MARKER}{}.{counter}", std::process::id()))
    }

    async fn sync_dir(path: &Path) {
        match fs::File::open(path).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    warn!(path = %path.display(), error = %err, "Directory sync failed");
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "Directory open failed"),
        }
    }
}

/// Deletes the temp file on drop unless it was renamed into place.
///
/// Covers error returns and futures dropped mid-write alike.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persisted(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "Temp file discarded"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(path = %self.path.display(), error = %err, "Failed to discard temp file"),
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), PackagerError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.contains("..") {
        Some("name contains '..'")
    } else if name.starts_with('.') {
        Some("name is hidden")
    } else if name.contains(TMP_MARKER) {
        Some("name collides with temp files")
    } else {
        None
    };

    reason.map_or(Ok(()), |reason| {
        Err(PackagerError::InvalidArtifactName { message: format!("'{name}': {reason}").into(), context: None })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_sandboxed() {
        for bad in ["", "../escape.js", "a/b.js", "a\\b.js", "x..js", ".hidden", "a.js.carvetmp.1"] {
            assert!(validate_name(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(validate_name("phaser-custom.min.js").is_ok());
    }

    #[test]
    fn temp_file_is_removed_unless_persisted() {
        let dir = tempfile::tempdir().unwrap();

        let dropped = dir.path().join("a.js.carvetmp.1.0");
        std::fs::write(&dropped, "partial").unwrap();
        drop(TempFile::new(dropped.clone()));
        assert!(!dropped.exists());

        let kept = dir.path().join("b.js.carvetmp.1.1");
        std::fs::write(&kept, "whole").unwrap();
        TempFile::new(kept.clone()).persisted();
        assert!(kept.exists());

        // Never created, e.g. the future was dropped before the first poll.
        drop(TempFile::new(dir.path().join("c.js.carvetmp.1.2")));
    }
}
