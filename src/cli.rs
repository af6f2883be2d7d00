//! Command line interface definition

use crate::config::{ArchiveSource, Config};
use crate::error::{Result, ToExitCode};
use crate::reporter::ConsoleReporter;
use crate::workflow::Stager;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code reported when the run is interrupted by a signal
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// fetch-stage - download a zip archive and stage its contents
#[derive(Parser, Debug)]
#[command(name = "fetch-stage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download a zip archive and stage its contents into a directory")]
#[command(long_about = None)]
pub struct Args {
    /// JSON config file; flags override its values
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// URL of the archive
    #[arg(short, long)]
    pub url: Option<String>,

    /// Directory that receives the extracted files
    #[arg(short = 'd', long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// File name of the archive inside the target directory
    #[arg(short, long, value_name = "NAME")]
    pub archive: Option<String>,

    /// Entry name to keep during cleanup (repeatable, adds to the config's list)
    #[arg(short, long = "keep", value_name = "NAME")]
    pub keep: Vec<String>,

    /// Bytes per write during download
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Use an archive already placed in the target directory instead of downloading
    #[arg(long)]
    pub existing: bool,

    /// Clean the target directory before staging
    #[arg(long)]
    pub clean: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Build the run configuration: config file (or defaults) plus flag overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = &self.url {
            config.remote_url = Some(url.clone());
        }
        if let Some(dir) = &self.target_dir {
            config.target_dir = dir.clone();
        }
        if let Some(name) = &self.archive {
            config.archive_filename = name.clone();
        }
        config.allow_list.extend(self.keep.iter().cloned());
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if self.existing {
            config.source = ArchiveSource::Existing;
        }
        if self.clean {
            config.clean = true;
        }

        Ok(config)
    }
}

/// Log filter used when `RUST_LOG` is not set
fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,fetch_stage=info",
        2 => "info,fetch_stage=debug",
        _ => "trace",
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the verbosity flag. Calling this twice is harmless.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Run the command line front end to completion
pub async fn run(args: Args) -> ExitCode {
    init_tracing(args.verbose);

    tokio::select! {
        result = stage(&args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("[!] {} ({})", e, e.error_code());
                ExitCode::from(e.exit_code())
            }
        },
        _ = wait_for_signal() => {
            eprintln!("[!] Interrupted");
            ExitCode::from(INTERRUPTED_EXIT_CODE)
        }
    }
}

async fn stage(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    let stager = Stager::new(config)?;
    let reporter = ConsoleReporter::new().spawn(stager.subscribe());

    let result = stager.run().await;

    // Closing the channel ends the reporter even if it missed the final event
    drop(stager);
    if let Err(e) = reporter.await {
        debug!(error = %e, "reporter task ended abnormally");
    }

    result.map(|_| ())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = wait_for_ctrl_c() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
