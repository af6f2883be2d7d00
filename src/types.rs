//! Core types and events for fetch-stage

use crate::error::{ArchiveCleanupError, CleanupEntryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Workflow stage, used to tag failures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Creating the target directory
    Prepare,
    /// Removing stale entries from the target directory
    Cleanup,
    /// Fetching the archive
    Download,
    /// Unpacking the archive
    Extract,
    /// Deleting the archive
    Finalize,
}

/// Cumulative download progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Bytes written to disk so far
    pub downloaded: u64,
    /// Declared total size, if the server sent one
    pub total: Option<u64>,
}

impl Progress {
    /// Percentage complete (0.0 to 100.0), or `None` when the total is unknown
    ///
    /// A declared total of zero is treated as unknown.
    pub fn percent(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => {
                Some((self.downloaded as f64 * 100.0 / total as f64).min(100.0) as f32)
            }
            _ => None,
        }
    }
}

/// Event emitted while the workflow runs
///
/// Events are informational only; sending never blocks or fails the
/// workflow, even when nobody is subscribed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Cleanup of the target directory started
    Cleaning {
        /// Directory being cleaned
        dir: PathBuf,
    },

    /// Cleanup finished (possibly with per-entry failures)
    Cleaned {
        /// Number of entries removed
        removed: usize,
        /// Number of entries kept by the allow-list
        kept: usize,
        /// Number of entries that could not be removed
        failed: usize,
    },

    /// Archive already present, download skipped
    DownloadSkipped {
        /// Existing archive
        archive: PathBuf,
    },

    /// Download started
    DownloadStarted {
        /// Requested URL
        url: String,
        /// Declared size, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },

    /// Download progress update, sent after every written chunk
    Downloading {
        /// Cumulative progress
        progress: Progress,
        /// Progress percentage (0.0 to 100.0), absent when the total is unknown
        #[serde(skip_serializing_if = "Option::is_none")]
        percent: Option<f32>,
    },

    /// Download finished and the archive is in place
    DownloadComplete {
        /// Archive path
        archive: PathBuf,
        /// Total bytes written
        bytes: u64,
    },

    /// Archive extraction started
    Extracting {
        /// Archive path
        archive: PathBuf,
        /// Destination directory
        dest: PathBuf,
    },

    /// Archive extraction completed
    ExtractComplete {
        /// Number of files written
        files: usize,
    },

    /// Archive deleted after extraction
    ArchiveRemoved {
        /// Archive path
        archive: PathBuf,
    },

    /// Archive could not be deleted (non-fatal)
    ArchiveRemovalFailed {
        /// Archive path
        archive: PathBuf,
        /// Error message
        error: String,
    },

    /// Workflow fully complete
    Complete {
        /// Populated target directory
        path: PathBuf,
    },

    /// Workflow aborted
    Failed {
        /// Stage where failure occurred
        stage: Stage,
        /// Error message
        error: String,
    },
}

/// What the cleanup stage did with one entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupAction {
    /// Name is in the allow-list, left untouched
    Kept,
    /// File or symlink unlinked
    RemovedFile,
    /// Directory removed recursively
    RemovedDir,
}

/// Outcome for one entry of the target directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanupEntry {
    /// Full path of the entry
    pub path: PathBuf,
    /// What happened to it
    pub outcome: Result<CleanupAction, CleanupEntryError>,
}

/// Aggregated per-entry results of a cleanup pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// One record per directory entry, in listing order
    pub entries: Vec<CleanupEntry>,
}

impl CleanupReport {
    /// Entries that were removed
    pub fn removed(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().filter_map(|e| match e.outcome {
            Ok(CleanupAction::RemovedFile) | Ok(CleanupAction::RemovedDir) => Some(&e.path),
            _ => None,
        })
    }

    /// Entries preserved by the allow-list
    pub fn kept(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().filter_map(|e| match e.outcome {
            Ok(CleanupAction::Kept) => Some(&e.path),
            _ => None,
        })
    }

    /// Entries that could not be removed
    pub fn failures(&self) -> impl Iterator<Item = &CleanupEntryError> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().err())
    }

    /// True when every non-allow-listed entry was removed
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// How the archive got into place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive was already present
    Skipped,
    /// Archive was fetched
    Downloaded {
        /// Bytes written
        bytes: u64,
    },
}

/// Summary of a successful workflow run
#[derive(Clone, Debug)]
pub struct StageReport {
    /// Cleanup results, `None` when cleanup was disabled
    pub cleanup: Option<CleanupReport>,
    /// Whether the archive was downloaded
    pub download: DownloadOutcome,
    /// Files written by extraction
    pub extracted: Vec<PathBuf>,
    /// Result of deleting the archive
    pub archive_removal: Result<(), ArchiveCleanupError>,
}
