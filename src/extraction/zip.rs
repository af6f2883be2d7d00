use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Open a ZIP entry by index
    fn open_zip_entry<'a>(
        archive: &'a mut zip::ZipArchive<std::fs::File>,
        index: usize,
        archive_path: &Path,
    ) -> Result<zip::read::ZipFile<'a>> {
        archive.by_index(index).map_err(|e| Error::ArchiveFormat {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP entry {}: {}", index, e),
        })
    }

    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        {
            let mut outfile = std::fs::File::create(&file_path)?;
            std::io::copy(&mut file, &mut outfile).map_err(|e| {
                // zip reports bad checksums and broken deflate streams as InvalidData
                if e.kind() == ErrorKind::InvalidData {
                    Error::ArchiveFormat {
                        archive: archive_path.to_path_buf(),
                        reason: format!("corrupt entry {}: {}", file.name(), e),
                    }
                } else {
                    Error::Io(e)
                }
            })?;
        }

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Special bits dropped, owner write bit always set
            let mode = (mode & 0o777) | 0o200;
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode))?;
        }

        Ok(Some(file_path))
    }

    /// Extract every entry of a ZIP archive below `dest_path`
    ///
    /// Blocking; use [`ZipExtractor::extract`] from async code. The archive
    /// handle is closed before this function returns on every path.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        std::fs::create_dir_all(dest_path)?;

        let file = std::fs::File::open(archive_path)?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::ArchiveFormat {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {}", e),
        })?;

        let mut extracted_files = Vec::new();

        for i in 0..archive.len() {
            let file = Self::open_zip_entry(&mut archive, i, archive_path)?;

            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }

    /// Extract a ZIP archive on the blocking thread pool
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        let archive_path_owned = archive_path.to_path_buf();
        let dest_path_owned = dest_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            Self::try_extract(&archive_path_owned, &dest_path_owned)
        })
        .await
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "extraction task panicked: {}",
                e
            )))
        })?
    }
}
