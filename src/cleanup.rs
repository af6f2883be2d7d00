//! Cleanup stage for removing stale entries from the target directory

use crate::error::{CleanupEntryError, Result};
use crate::types::{CleanupAction, CleanupEntry, CleanupReport};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Kind of a directory entry as seen without following symlinks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryKind {
    /// Regular file or symlink (to anything), unlinked directly
    File,
    /// Real directory, removed recursively
    Dir,
}

/// Remove every entry of `dir` whose file name is not in `allow_list`
///
/// Only the top level of `dir` is inspected; an allow-listed directory is kept
/// with all of its contents. Symlinks are never followed, so a link to a
/// directory is unlinked rather than emptied.
///
/// Failures to delete single entries are recorded in the report and logged
/// once every entry has been attempted. Only a failure to list `dir` itself
/// is returned as an error.
pub async fn clean_directory(dir: &Path, allow_list: &HashSet<&str>) -> Result<CleanupReport> {
    debug!(?dir, allowed = allow_list.len(), "cleaning directory");

    let mut listing = fs::read_dir(dir).await?;
    let mut targets: Vec<(PathBuf, std::io::Result<EntryKind>)> = Vec::new();
    let mut report = CleanupReport::default();

    loop {
        let entry = match listing.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(?dir, error = %e, "failed to read directory entry, stopping listing");
                break;
            }
        };

        let path = entry.path();
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| allow_list.contains(n)) {
            debug!(?path, "keeping allow-listed entry");
            report.entries.push(CleanupEntry {
                path,
                outcome: Ok(CleanupAction::Kept),
            });
            continue;
        }

        // DirEntry::file_type does not traverse symlinks
        let kind = entry.file_type().await.map(|ft| {
            if ft.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            }
        });
        targets.push((path, kind));
    }

    for (path, kind) in targets {
        let outcome = match kind {
            Ok(kind) => remove_entry(&path, kind).await,
            Err(e) => Err(CleanupEntryError {
                path: path.clone(),
                reason: format!("failed to inspect entry: {}", e),
            }),
        };
        report.entries.push(CleanupEntry { path, outcome });
    }

    for failure in report.failures() {
        warn!(path = ?failure.path, reason = %failure.reason, "failed to delete entry");
    }

    info!(
        ?dir,
        removed = report.removed().count(),
        kept = report.kept().count(),
        failed = report.failures().count(),
        "cleanup complete"
    );

    Ok(report)
}

async fn remove_entry(
    path: &Path,
    kind: EntryKind,
) -> std::result::Result<CleanupAction, CleanupEntryError> {
    let result = match kind {
        EntryKind::File => fs::remove_file(path)
            .await
            .map(|_| CleanupAction::RemovedFile),
        EntryKind::Dir => fs::remove_dir_all(path)
            .await
            .map(|_| CleanupAction::RemovedDir),
    };

    match result {
        Ok(action) => {
            debug!(?path, ?action, "deleted entry");
            Ok(action)
        }
        Err(e) => Err(CleanupEntryError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
