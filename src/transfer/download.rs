//! Streaming the archive to disk

use super::traits::{ByteStream, Transport};
use crate::error::{Result, TransferError};
use crate::types::{Event, Progress};
use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Where and how to write a download
#[derive(Clone, Copy, Debug)]
pub struct DownloadTarget<'a> {
    /// Final archive location
    pub archive_path: &'a Path,
    /// Temporary location the body is streamed into
    pub partial_path: &'a Path,
    /// Bytes per write and per progress event
    pub chunk_size: usize,
}

/// Fetch `url` into `target.archive_path`
///
/// A non-2xx status fails before any file is created. The body is written to
/// `target.partial_path` in `chunk_size` pieces (the last one may be shorter),
/// with a [`Event::Downloading`] after each piece, and only renamed onto the
/// archive path once the stream has ended cleanly. On any error the partial
/// file is closed and removed.
///
/// Returns the number of bytes written.
pub async fn download_to(
    transport: &dyn Transport,
    url: &str,
    target: DownloadTarget<'_>,
    event_tx: &broadcast::Sender<Event>,
) -> Result<u64> {
    debug!(url, archive = ?target.archive_path, "requesting archive");

    let response = transport.get(url).await?;

    if !response.is_success() {
        warn!(url, status = response.status, "server returned an error status");
        return Err(TransferError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        }
        .into());
    }

    let total = response.content_length;
    info!(url, ?total, "downloading archive");
    event_tx
        .send(Event::DownloadStarted {
            url: url.to_string(),
            total,
        })
        .ok();

    let file = File::create(target.partial_path).await?;
    let written = match write_body(file, response.body, total, target.chunk_size, event_tx).await {
        Ok(written) => written,
        Err(e) => {
            // write_body owns the handle, so it is closed by now
            if let Err(remove_err) = tokio::fs::remove_file(target.partial_path).await {
                warn!(
                    path = ?target.partial_path,
                    error = %remove_err,
                    "failed to remove partial download"
                );
            }
            return Err(e);
        }
    };

    tokio::fs::rename(target.partial_path, target.archive_path).await?;

    info!(
        archive = ?target.archive_path,
        bytes = written,
        "download complete"
    );
    event_tx
        .send(Event::DownloadComplete {
            archive: target.archive_path.to_path_buf(),
            bytes: written,
        })
        .ok();

    Ok(written)
}

/// Drain `body` into `file` in fixed-size pieces
async fn write_body(
    mut file: File,
    mut body: ByteStream,
    total: Option<u64>,
    chunk_size: usize,
    event_tx: &broadcast::Sender<Event>,
) -> Result<u64> {
    // Grows with the received data, never past one chunk
    let mut pending: Vec<u8> = Vec::new();
    let mut progress = Progress {
        downloaded: 0,
        total,
    };

    while let Some(next) = body.next().await {
        let received = next?;
        let mut rest = &received[..];

        while !rest.is_empty() {
            let take = (chunk_size - pending.len()).min(rest.len());
            pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if pending.len() == chunk_size {
                write_chunk(&mut file, &mut pending, &mut progress, event_tx).await?;
            }
        }
    }

    if !pending.is_empty() {
        write_chunk(&mut file, &mut pending, &mut progress, event_tx).await?;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(progress.downloaded)
}

async fn write_chunk(
    file: &mut File,
    pending: &mut Vec<u8>,
    progress: &mut Progress,
    event_tx: &broadcast::Sender<Event>,
) -> Result<()> {
    file.write_all(pending).await?;
    progress.downloaded += pending.len() as u64;
    pending.clear();

    event_tx
        .send(Event::Downloading {
            progress: *progress,
            percent: progress.percent(),
        })
        .ok();

    Ok(())
}
