//! Configuration types for fetch-stage

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default write and progress granularity (8 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Largest accepted chunk size (16 MiB)
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Where the archive comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveSource {
    /// Download the archive unless it is already present (default)
    #[default]
    Download,
    /// The archive is supplied externally; its absence is fatal
    Existing,
}

/// Configuration for a single fetch-and-stage run
///
/// Every field has a default, so a JSON config file only needs to name what
/// differs. Command-line flags are applied on top of the loaded record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL of the archive (required when `source` is `download`)
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Directory that receives the extracted files (default: "./staging")
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// File name of the archive inside `target_dir` (default: "archive.zip")
    #[serde(default = "default_archive_filename")]
    pub archive_filename: String,

    /// Entry names that survive the cleanup stage (exact match)
    #[serde(default)]
    pub allow_list: Vec<String>,

    /// Size of each write during download, also the progress granularity
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Download the archive or require it to exist already
    #[serde(default)]
    pub source: ArchiveSource,

    /// Clean the target directory before downloading/extracting
    #[serde(default)]
    pub clean: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            target_dir: default_target_dir(),
            archive_filename: default_archive_filename(),
            allow_list: Vec::new(),
            chunk_size: default_chunk_size(),
            source: ArchiveSource::default(),
            clean: false,
        }
    }
}

impl Config {
    /// Load a config record from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
            key: None,
        })?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Full path of the archive inside the target directory
    pub fn archive_path(&self) -> PathBuf {
        self.target_dir.join(&self.archive_filename)
    }

    /// Path the download is streamed into before it is renamed into place
    pub fn partial_path(&self) -> PathBuf {
        self.target_dir.join(format!("{}.part", self.archive_filename))
    }

    /// Allow-list as a set for exact-name lookups
    pub fn allow_set(&self) -> HashSet<&str> {
        self.allow_list.iter().map(String::as_str).collect()
    }

    /// Check the record for values the workflow cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size", "chunk size must be positive"));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::config(
                "chunk_size",
                format!(
                    "chunk size {} exceeds the maximum of {} bytes",
                    self.chunk_size, MAX_CHUNK_SIZE
                ),
            ));
        }

        validate_archive_filename(&self.archive_filename)?;

        if self.source == ArchiveSource::Existing
            && self.clean
            && !self.allow_list.contains(&self.archive_filename)
        {
            return Err(Error::config(
                "allow_list",
                format!(
                    "cleaning before extracting an existing archive would delete '{}'; add it to the allow-list",
                    self.archive_filename
                ),
            ));
        }

        if self.source == ArchiveSource::Download {
            let url = self.remote_url.as_deref().ok_or_else(|| {
                Error::config("remote_url", "a remote URL is required when downloading")
            })?;
            validate_remote_url(url)?;
        }

        Ok(())
    }
}

/// The archive name must be a bare file name inside the target directory
fn validate_archive_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::config(
            "archive_filename",
            "archive file name must not be empty",
        ));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::config(
            "archive_filename",
            format!("archive file name '{}' must be a plain file name", name),
        ));
    }
    Ok(())
}

fn validate_remote_url(url_str: &str) -> Result<()> {
    let parsed = url::Url::parse(url_str)
        .map_err(|e| Error::config("remote_url", format!("invalid URL '{}': {}", url_str, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::config(
            "remote_url",
            format!(
                "URL scheme '{}' is not allowed; only http and https are supported",
                scheme
            ),
        )),
    }
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("./staging")
}

fn default_archive_filename() -> String {
    "archive.zip".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
