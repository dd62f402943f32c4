//! One-shot dataset loading over HTTP or from local files.
//!
//! The two datasets are each loaded exactly once at startup; a failed
//! load is reported and never retried.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Seam over the HTTP layer so loading can be exercised without a network.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response>;
}

/// The plain [`reqwest`] client.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

/// Where a dataset comes from: a URL to fetch or a local file to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        if value.starts_with("http") {
            Source::Url(value.to_string())
        } else {
            Source::File(PathBuf::from(value))
        }
    }
}

/// Fetches a URL and returns the response body.
///
/// # Errors
///
/// Returns an error for connection failures and for non-success HTTP
/// status codes; an error page must not flow into the parsers as data.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}

/// Loads a dataset from its source, attempted once.
pub async fn load_source<C: HttpClient>(client: &C, source: &Source) -> Result<Bytes> {
    match source {
        Source::Url(url) => fetch_bytes(client, url)
            .await
            .with_context(|| format!("fetching {url}")),
        Source::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(Bytes::from(bytes))
        }
    }
}
