//! Transport abstraction for fetching the archive

use crate::error::{Result, TransferError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Streamed response body, one item per received chunk
pub type ByteStream = BoxStream<'static, std::result::Result<Bytes, TransferError>>;

/// Response to a GET request, before the body has been read
pub struct TransferResponse {
    /// HTTP status code
    pub status: u16,
    /// Declared body size (`Content-Length`), if the server sent one
    pub content_length: Option<u64>,
    /// Body stream
    pub body: ByteStream,
}

impl TransferResponse {
    /// Any 2xx status counts as success
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransferResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Trait for issuing the archive request
///
/// The workflow only ever needs a single streaming GET. Implementations report
/// connection failures as [`TransferError::Network`] and leave status checking
/// to the caller, so every transport gets the same non-2xx handling.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request for `url` and return the status and body stream
    async fn get(&self, url: &str) -> Result<TransferResponse>;
}
