//! HTTP document transport.
//!
//! `GET {base_url}/{document_id}`，响应体即文档内容。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docvault_traits::{Transport, TransportError};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::error::{DocVaultError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest 实现的文档传输
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docvault/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DocVaultError::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(client, base_url)
    }

    /// Use a preconfigured client (proxies, custom TLS roots).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            DocVaultError::configuration(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DocVaultError::configuration(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Document URL, with the id percent-encoded as a single path segment.
    pub fn document_url(&self, document_id: &str) -> std::result::Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::permanent("base URL cannot carry a path"))?
            .pop_if_empty()
            .push(document_id);
        Ok(url)
    }
}

/// 非 2xx 状态码的分类
///
/// 5xx, 408 and 429 may succeed later; anything else will not.
pub fn classify_status(status: StatusCode) -> TransportError {
    let msg = format!("server responded with {}", status);
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        TransportError::Transient(msg)
    } else {
        TransportError::Permanent(msg)
    }
}

fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_builder() || err.is_redirect() {
        TransportError::permanent(err.to_string())
    } else {
        // connect, timeout, request and body errors
        TransportError::transient(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_bytes(&self, document_id: &str) -> std::result::Result<Bytes, TransportError> {
        let url = self.document_url(document_id)?;
        debug!(%url, "GET document");

        let response = self.client.get(url).send().await.map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response.bytes().await.map_err(classify_error)
    }
}
