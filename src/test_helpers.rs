//! Shared test helpers: in-memory transports and zip fixtures.

use crate::error::{Result, TransferError};
use crate::transfer::{TransferResponse, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Transport that serves a fixed response from memory
pub(crate) struct MemoryTransport {
    status: u16,
    content_length: Option<u64>,
    chunks: Vec<Vec<u8>>,
    /// Break the body stream after this many chunks
    fail_after: Option<usize>,
    requests: AtomicUsize,
}

impl MemoryTransport {
    /// 200 response with a declared length, body split into `pieces` chunks
    pub(crate) fn ok(body: &[u8], pieces: usize) -> Self {
        let piece_len = body.len().div_ceil(pieces.max(1)).max(1);
        Self {
            status: 200,
            content_length: Some(body.len() as u64),
            chunks: body.chunks(piece_len).map(<[u8]>::to_vec).collect(),
            fail_after: None,
            requests: AtomicUsize::new(0),
        }
    }

    /// Response with the given status and an empty body
    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            content_length: Some(0),
            chunks: Vec::new(),
            fail_after: None,
            requests: AtomicUsize::new(0),
        }
    }

    /// Drop the declared length
    pub(crate) fn without_length(mut self) -> Self {
        self.content_length = None;
        self
    }

    /// Break the stream after `n` chunks
    pub(crate) fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of `get` calls served so far
    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<TransferResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let mut items: Vec<std::result::Result<Bytes, TransferError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(TransferError::Network {
                url: url.to_string(),
                reason: "connection reset by peer".to_string(),
            }));
        }

        Ok(TransferResponse {
            status: self.status,
            content_length: self.content_length,
            body: futures::stream::iter(items).boxed(),
        })
    }
}

/// Transport whose requests never reach a server
pub(crate) struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn get(&self, url: &str) -> Result<TransferResponse> {
        Err(TransferError::Network {
            url: url.to_string(),
            reason: "connection failed: connection refused".to_string(),
        }
        .into())
    }
}

/// Build a ZIP archive in memory
pub(crate) fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Write a ZIP archive to disk
pub(crate) fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    std::fs::write(path, zip_bytes(files)).unwrap();
}
