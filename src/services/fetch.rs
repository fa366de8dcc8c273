// src/services/fetch.rs

//! Page fetching over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{AppError, Result};

/// Retrieves page content for a URL.
///
/// The crawl engine only requires that this operation eventually completes or
/// fails and never blocks past the cancellation signal; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url`, honoring the crawl-wide cancellation signal.
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<String>;
}

/// `PageFetcher` backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and request timeout.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<String> {
        let request = async {
            let response = self.client.get(url.clone()).send().await?;
            let body = response.error_for_status()?.text().await?;
            Ok::<_, AppError>(body)
        };
        tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            body = request => body,
        }
    }
}
