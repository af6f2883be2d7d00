//! Fetch-and-stage workflow
//!
//! Runs the stages strictly in order:
//! 1. Prepare - create the target directory, check for a supplied archive
//! 2. Cleanup - remove entries not on the allow-list (optional)
//! 3. Download - fetch the archive unless it is already present
//! 4. Extract - unpack the archive into the target directory
//! 5. Finalize - delete the archive (failure is reported, not fatal)

use crate::cleanup::clean_directory;
use crate::config::{ArchiveSource, Config};
use crate::error::{ArchiveCleanupError, Error, Result};
use crate::extraction::ZipExtractor;
use crate::transfer::{DownloadTarget, HttpTransport, Transport, download_to};
use crate::types::{CleanupReport, DownloadOutcome, Event, Stage, StageReport};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};


/// Capacity of the event channel; progress events are dropped for slow subscribers
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Fetch-and-stage workflow executor
pub struct Stager {
    /// Validated configuration
    config: Arc<Config>,
    /// Transport used for the download stage
    transport: Arc<dyn Transport>,
    /// Event channel for progress and phase reporting
    event_tx: broadcast::Sender<Event>,
}

impl Stager {
    /// Create a workflow that downloads over HTTP(S)
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Create a workflow with a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            transport,
            event_tx,
        })
    }

    /// Subscribe to workflow events
    ///
    /// Subscribe before calling [`Stager::run`]; events sent earlier are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this workflow runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage once
    ///
    /// Fatal errors stop the workflow at the stage where they happen and are
    /// returned; non-fatal cleanup failures end up in the [`StageReport`].
    pub async fn run(&self) -> Result<StageReport> {
        info!(
            target_dir = ?self.config.target_dir,
            archive = %self.config.archive_filename,
            source = ?self.config.source,
            clean = self.config.clean,
            "starting fetch-and-stage workflow"
        );

        let mut stage = Stage::Prepare;
        let result = self.run_stages(&mut stage).await;

        match &result {
            Ok(_) => {
                info!(target_dir = ?self.config.target_dir, "workflow complete");
                self.emit(Event::Complete {
                    path: self.config.target_dir.clone(),
                });
            }
            Err(e) => {
                error!(?stage, error = %e, "workflow failed");
                self.emit(Event::Failed {
                    stage,
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn run_stages(&self, stage: &mut Stage) -> Result<StageReport> {
        let target_dir = &self.config.target_dir;
        let archive_path = self.config.archive_path();

        *stage = Stage::Prepare;
        tokio::fs::create_dir_all(target_dir).await?;

        if self.config.source == ArchiveSource::Existing && !archive_present(&archive_path).await
        {
            warn!(?archive_path, "archive expected but not found");
            return Err(Error::MissingArchive { path: archive_path });
        }

        let cleanup = if self.config.clean {
            *stage = Stage::Cleanup;
            Some(self.run_cleanup_stage(target_dir).await?)
        } else {
            debug!("cleanup disabled, skipping");
            None
        };

        *stage = Stage::Download;
        let download = self.run_download_stage(&archive_path).await?;

        *stage = Stage::Extract;
        let extracted = self.run_extract_stage(&archive_path, target_dir).await?;

        *stage = Stage::Finalize;
        let archive_removal = remove_archive(&archive_path).await;
        match &archive_removal {
            Ok(()) => self.emit(Event::ArchiveRemoved {
                archive: archive_path.clone(),
            }),
            Err(e) => self.emit(Event::ArchiveRemovalFailed {
                archive: archive_path.clone(),
                error: e.reason.clone(),
            }),
        }

        Ok(StageReport {
            cleanup,
            download,
            extracted,
            archive_removal,
        })
    }

    async fn run_cleanup_stage(&self, target_dir: &Path) -> Result<CleanupReport> {
        self.emit(Event::Cleaning {
            dir: target_dir.to_path_buf(),
        });

        let report = clean_directory(target_dir, &self.config.allow_set()).await?;

        self.emit(Event::Cleaned {
            removed: report.removed().count(),
            kept: report.kept().count(),
            failed: report.failures().count(),
        });
        Ok(report)
    }

    async fn run_download_stage(&self, archive_path: &Path) -> Result<DownloadOutcome> {
        if archive_present(archive_path).await {
            info!(?archive_path, "archive already present, skipping download");
            self.emit(Event::DownloadSkipped {
                archive: archive_path.to_path_buf(),
            });
            return Ok(DownloadOutcome::Skipped);
        }

        if self.config.source == ArchiveSource::Existing {
            // Only reachable if the archive vanished after the prepare stage
            return Err(Error::MissingArchive {
                path: archive_path.to_path_buf(),
            });
        }

        let url = self
            .config
            .remote_url
            .as_deref()
            .ok_or_else(|| Error::config("remote_url", "no remote URL configured"))?;

        let partial_path = self.config.partial_path();
        let bytes = download_to(
            self.transport.as_ref(),
            url,
            DownloadTarget {
                archive_path,
                partial_path: &partial_path,
                chunk_size: self.config.chunk_size,
            },
            &self.event_tx,
        )
        .await?;

        Ok(DownloadOutcome::Downloaded { bytes })
    }

    async fn run_extract_stage(
        &self,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<std::path::PathBuf>> {
        self.emit(Event::Extracting {
            archive: archive_path.to_path_buf(),
            dest: dest_path.to_path_buf(),
        });

        let extracted = ZipExtractor::extract(archive_path, dest_path).await?;

        self.emit(Event::ExtractComplete {
            files: extracted.len(),
        });
        Ok(extracted)
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

/// Delete the archive after extraction
///
/// Failures are logged and returned for the report; they never fail the run.
pub async fn remove_archive(archive_path: &Path) -> std::result::Result<(), ArchiveCleanupError> {
    match tokio::fs::remove_file(archive_path).await {
        Ok(()) => {
            info!(?archive_path, "removed archive");
            Ok(())
        }
        Err(e) => {
            warn!(?archive_path, error = %e, "failed to delete archive");
            Err(ArchiveCleanupError {
                archive: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

async fn archive_present(archive_path: &Path) -> bool {
    tokio::fs::metadata(archive_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
