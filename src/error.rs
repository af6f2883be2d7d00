//! Error types for fetch-stage
//!
//! Fatal errors abort the workflow and surface through [`Error`]. The two
//! cleanup failures ([`CleanupEntryError`] and [`ArchiveCleanupError`]) are
//! never propagated with `?`; they are collected into reports and logged.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fetch-stage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetch-stage
///
/// Every variant stops the workflow. Each one carries enough context to tell
/// the user which path or URL was involved.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chunk_size")
        key: Option<String>,
    },

    /// The archive was expected to be supplied externally but is absent
    #[error("archive not found at {path}")]
    MissingArchive {
        /// Where the archive was expected
        path: PathBuf,
    },

    /// Download failed (bad status or network failure)
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// The archive is not a readable zip container
    #[error("invalid archive {archive}: {reason}")]
    ArchiveFormat {
        /// The archive file that could not be read
        archive: PathBuf,
        /// The reason the archive was rejected
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (config files)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The status code returned by the server
        status: u16,
    },

    /// Connection failed or the body stream broke off
    #[error("network failure fetching {url}: {reason}")]
    Network {
        /// The requested URL
        url: String,
        /// The underlying client error
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Failure to delete one entry during the pre-extraction cleanup
///
/// Non-fatal: the cleanup moves on to the next entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to delete {path}: {reason}")]
pub struct CleanupEntryError {
    /// The entry that could not be removed
    pub path: PathBuf,
    /// The reason deletion failed
    pub reason: String,
}

/// Failure to delete the archive after a successful extraction
///
/// Non-fatal: the extracted payload is already in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to delete archive {archive}: {reason}")]
pub struct ArchiveCleanupError {
    /// The archive that was left behind
    pub archive: PathBuf,
    /// The reason deletion failed
    pub reason: String,
}

/// Map errors to process exit codes for the command-line front end
pub trait ToExitCode {
    /// Get the process exit code for this error (never 0)
    fn exit_code(&self) -> u8;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) => 1,
            Error::Config { .. } | Error::Serialization(_) => 2,
            Error::MissingArchive { .. } => 3,
            Error::Transfer(_) => 4,
            Error::ArchiveFormat { .. } => 5,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MissingArchive { .. } => "missing_archive",
            Error::Transfer(e) => match e {
                TransferError::HttpStatus { .. } => "http_status",
                TransferError::Network { .. } => "network_error",
                TransferError::Client(_) => "client_error",
            },
            Error::ArchiveFormat { .. } => "archive_format",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}
