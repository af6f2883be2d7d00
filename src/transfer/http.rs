//! reqwest-backed transport

use super::traits::{TransferResponse, Transport};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use futures::StreamExt;

/// User agent sent with every request
const USER_AGENT: &str = concat!("fetch-stage/", env!("CARGO_PKG_VERSION"));

/// HTTP(S) transport built on a shared `reqwest::Client`
///
/// No timeout is configured beyond the client defaults.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransferError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn network_error(url: &str, e: &reqwest::Error) -> TransferError {
    let reason = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    TransferError::Network {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransferResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, &e))?;

        let status = response.status().as_u16();
        let content_length = response.content_length();

        let url_owned = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| network_error(&url_owned, &e)))
            .boxed();

        Ok(TransferResponse {
            status,
            content_length,
            body,
        })
    }
}
