//! Feed fetching.
//!
//! Retrieves the publication feed and the metrics summary relative to a site
//! root. HTTP(S) roots are fetched with caching disabled and a timestamp query
//! parameter so intermediary caches cannot serve a stale copy; `file://`
//! roots are read from disk. Failures never propagate past
//! [`FeedFetcher::fetch_publications`] and [`FeedFetcher::fetch_metrics`]:
//! they are logged and degrade to an empty feed or absent metrics.

use crate::error::{Result, ScholarPageError};
use crate::record::{parse_feed, MetricsSummary, PublicationRecord};
use crate::source::DataSource;
use futures::future::join;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// User agent string for feed requests
const USER_AGENT: &str = concat!("scholarpage/", env!("CARGO_PKG_VERSION"));

/// Query parameter carrying the cache-busting token
pub const CACHE_BUST_PARAM: &str = "t";

/// Fetcher settings
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Append a timestamp to HTTP feed URLs
    pub cache_bust: bool,
    /// Transport timeout; the client default when unset
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache_bust: true,
            timeout: None,
        }
    }
}

/// Both feeds of one page load
#[derive(Debug, Clone, Default)]
pub struct Feeds {
    pub publications: Vec<PublicationRecord>,
    pub metrics: Option<MetricsSummary>,
}

/// Client for the static feeds under a site root
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    base: Url,
    options: FetchOptions,
}

/// Make sure relative joins land inside the base directory
fn directory_url(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

impl FeedFetcher {
    pub fn new(base: Url, options: FetchOptions) -> Result<Self> {
        match base.scheme() {
            "http" | "https" | "file" => {}
            other => {
                return Err(ScholarPageError::Config(format!(
                    "Unsupported feed scheme '{}'",
                    other
                )))
            }
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ScholarPageError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: directory_url(base),
            options,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of a feed path, with the cache-busting token for HTTP roots
    pub fn feed_url(&self, relative: &str) -> Result<Url> {
        let mut url = self
            .base
            .join(relative)
            .map_err(|e| ScholarPageError::Config(format!("Invalid feed path '{}': {}", relative, e)))?;

        if self.options.cache_bust && url.scheme() != "file" {
            let token = chrono::Utc::now().timestamp_millis().to_string();
            url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &token);
        }
        Ok(url)
    }

    /// Fetch and parse one JSON resource
    pub async fn fetch_json(&self, relative: &str) -> Result<Value> {
        let url = self.feed_url(relative)?;
        debug!(url = %url, "Fetching feed");

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| ScholarPageError::Config(format!("Invalid file URL: {}", url)))?;
            let bytes = tokio::fs::read(&path).await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let response = self
            .client
            .get(url.as_str())
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScholarPageError::Api {
                code: status.as_u16(),
                message: format!("Feed request failed: {}", status),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Publication feed of `source`; empty on any failure
    pub async fn fetch_publications(&self, source: DataSource) -> Vec<PublicationRecord> {
        let path = source.publications_path();
        match self.fetch_json(&path).await.and_then(parse_feed) {
            Ok(records) => {
                info!(source = %source, count = records.len(), "Loaded publication feed");
                records
            }
            Err(e) => {
                warn!(source = %source, path = %path, error = %e, "Publication feed unavailable");
                Vec::new()
            }
        }
    }

    /// Metrics summary of `source`; `None` on any failure
    pub async fn fetch_metrics(&self, source: DataSource) -> Option<MetricsSummary> {
        let path = source.metrics_path();
        match self.fetch_json(&path).await.and_then(MetricsSummary::from_value) {
            Ok(summary) => {
                info!(source = %source, "Loaded metrics summary");
                Some(summary)
            }
            Err(e) => {
                warn!(source = %source, path = %path, error = %e, "Metrics summary unavailable");
                None
            }
        }
    }

    /// Fetch both feeds concurrently; each degrades independently.
    pub async fn fetch_feeds(&self, source: DataSource) -> Feeds {
        let (publications, metrics) =
            join(self.fetch_publications(source), self.fetch_metrics(source)).await;
        Feeds {
            publications,
            metrics,
        }
    }
}
