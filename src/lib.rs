//! # fetch-stage
//!
//! Fetch a zip archive and stage its contents into a target directory.
//!
//! A single run:
//! - creates the target directory if needed
//! - optionally clears it, keeping the entries named in an allow-list
//! - downloads the archive unless it is already present, reporting progress
//! - extracts the archive into the target directory
//! - deletes the archive
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetch_stage::{Config, Stager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         remote_url: Some("https://example.com/files/Viewer.zip".to_string()),
//!         target_dir: "Viewer".into(),
//!         archive_filename: "Viewer.zip".to_string(),
//!         allow_list: vec!["settings.json".to_string()],
//!         clean: true,
//!         ..Default::default()
//!     };
//!
//!     let stager = Stager::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = stager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = stager.run().await?;
//!     println!("extracted {} files", report.extracted.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Pre-extraction cleanup of the target directory
pub mod cleanup;
/// Command-line front end
pub mod cli;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Console progress rendering
pub mod reporter;
/// Archive download
pub mod transfer;
/// Core types and events
pub mod types;
/// Fetch-and-stage workflow
pub mod workflow;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ArchiveSource, Config};
pub use error::{
    ArchiveCleanupError, CleanupEntryError, Error, Result, ToExitCode, TransferError,
};
pub use reporter::ConsoleReporter;
pub use transfer::{HttpTransport, Transport};
pub use types::{CleanupReport, DownloadOutcome, Event, Progress, Stage, StageReport};
pub use workflow::Stager;
