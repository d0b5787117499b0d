//! HTTP transport for downloading bi5 blobs.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("tickwell/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport-level failures. Any of these is a transient fetch error for the
/// window that triggered it.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-HTTP transport failure reported by a custom fetcher.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Status code and body of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body. Empty for non-200 statuses.
    pub body: Bytes,
}

impl FetchResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Creates a `200 OK` response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK.as_u16(), body.into())
    }

    /// Creates a bodiless response with the given status.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self::new(status, Bytes::new())
    }

    /// Returns true for `200 OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// Returns true for `404 Not Found`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }
}

/// Performs one GET per window.
///
/// Implementations must not retry: the pipeline's failure policy decides what
/// happens after a bad status or a transport error.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches `url`, returning the status code and body.
    ///
    /// # Errors
    ///
    /// Returns an error when no HTTP response was obtained.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// HTTP client backed by `reqwest` with connection pooling.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            // Sequential fetches reuse one keep-alive connection
            .pool_max_idle_per_host(1)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl SourceFetcher for DownloadClient {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(url, error = %err, "Request failed");
                return Err(err.into());
            }
        };
        let status = response.status();

        if status != StatusCode::OK {
            trace!(url, status = status.as_u16(), "Non-OK response");
            return Ok(FetchResponse::status(status.as_u16()));
        }

        let body = response.bytes().await?;
        trace!(url, bytes = body.len(), "Downloaded");
        Ok(FetchResponse::new(status.as_u16(), body))
    }
}
