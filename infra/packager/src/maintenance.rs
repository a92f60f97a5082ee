use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

pub(crate) const TMP_MARKER: &str = ".carvetmp.";

/// Removes temp files left behind by interrupted writes.
pub(crate) async fn purge_tmp(root: &Path, older_than: Duration) -> usize {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now, older_than)).await {
        Ok((removed, failed)) => {
            if removed > 0 || failed > 0 {
                info!(removed, failed, "Cleaned up orphaned temp files");
            }
            removed
        }
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
            0
        }
    }
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| is_tmp(entry) && is_stale(entry, now, threshold))
        .for_each(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove temp file");
                failed += 1;
            }
        });

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    std::fs::metadata(entry.path())
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age >= threshold)
}
