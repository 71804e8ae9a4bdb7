//! Remote artifact fetching.
//!
//! The provider only needs "download this identifier to that path"; the
//! [`Fetcher`] trait is that capability. [`HttpFetcher`] implements it over
//! HTTP(S) with a URL template, streaming the body to disk and retrying
//! transient failures with exponential backoff.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::Config;

/// Errors from a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote identifier cannot be turned into a request.
    #[error("invalid remote identifier {0:?}")]
    InvalidIdentifier(String),

    /// The URL template has no `{id}` placeholder.
    #[error("URL template {0:?} has no {{id}} placeholder")]
    InvalidTemplate(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The body ended before `Content-Length` bytes arrived.
    #[error("truncated transfer: received {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Writing the downloaded bytes failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Returns `true` when the error is transient and the fetch may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Truncated { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Self::InvalidIdentifier(_) | Self::InvalidTemplate(_) | Self::Io(_) => false,
        }
    }
}

/// Convenience alias for fetch results.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Downloads an artifact by remote identifier to a local path.
///
/// Implementations write to `dest` directly; the caller owns cleanup and
/// the final move into place.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, remote_id: &str, dest: &Path) -> FetchResult<()>;
}

/// HTTP(S) fetcher driven by a URL template.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    url_template: String,
    retries: usize,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher.
    ///
    /// `timeout` bounds each individual request.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        url_template: impl Into<String>,
        timeout: Duration,
        retries: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("cinematch/0.1.0 (https://github.com/oxur/cinematch)")
            .build()?;

        Ok(Self {
            http,
            url_template: url_template.into(),
            retries,
        })
    }

    /// Create a fetcher from the loaded configuration.
    ///
    /// Each attempt gets an equal share of `request_timeout_secs`, so a
    /// request that times out still leaves budget for the retries.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.remote_url_template.clone(),
            attempt_timeout(config.request_timeout(), config.download_retries),
            config.download_retries,
        )
    }

    /// Expand the URL template for `remote_id`.
    pub fn url_for(&self, remote_id: &str) -> FetchResult<String> {
        let remote_id = remote_id.trim();
        if remote_id.is_empty() || remote_id.chars().any(char::is_whitespace) {
            return Err(FetchError::InvalidIdentifier(remote_id.to_string()));
        }
        if !self.url_template.contains("{id}") {
            return Err(FetchError::InvalidTemplate(self.url_template.clone()));
        }
        Ok(self.url_template.replace("{id}", remote_id))
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> FetchResult<u64> {
        let mut response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let expected = response.content_length();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut received: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if received != expected {
                return Err(FetchError::Truncated { expected, received });
            }
        }

        Ok(received)
    }
}

/// Per-request bound when `total` is shared by the first attempt and
/// `retries` retries. Never below one second.
pub fn attempt_timeout(total: Duration, retries: usize) -> Duration {
    let attempts = u32::try_from(retries.saturating_add(1)).unwrap_or(u32::MAX);
    (total / attempts).max(Duration::from_secs(1))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, remote_id: &str, dest: &Path) -> FetchResult<()> {
        let url = self.url_for(remote_id)?;

        let bytes = (|| async { self.fetch_once(&url, dest).await })
            .retry(ExponentialBuilder::default().with_max_times(self.retries))
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, delay: Duration| {
                log::warn!("Retrying download of {} in {:?}: {}", remote_id, delay, err);
            })
            .await?;

        log::debug!("Fetched {} bytes for {}", bytes, remote_id);
        Ok(())
    }
}
