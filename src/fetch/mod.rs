//! Fetch jobs: one HTTP GET per logical resource, normalized and written
//! through to the snapshot store.

pub mod xml;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::store::{Snapshot, SnapshotKey, SnapshotStore};

/// What can go wrong talking to the upstream. Background ticks log these and
/// move on; only the on-demand point-table path surfaces them to a caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    UpstreamStatus(StatusCode),
    #[error("upstream payload malformed: {0}")]
    UpstreamMalformed(String),
}

/// An upstream response body tagged by content kind, decided before any
/// parsing so normalization is a pure function over a typed input.
#[derive(Debug, PartialEq)]
pub enum Payload {
    Json(String),
    Xml(String),
}

/// A body beginning with an XML declaration is XML; everything else is
/// treated as JSON.
pub fn classify(body: String) -> Payload {
    if body.starts_with("<?xml") {
        Payload::Xml(body)
    } else {
        Payload::Json(body)
    }
}

/// Turn a classified body into the value stored in a snapshot. JSON passes
/// through untransformed; XML is converted to its nested-object form and a
/// top-level `standings` wrapper is peeled off.
pub fn normalize(payload: Payload) -> Result<Value, FetchError> {
    match payload {
        Payload::Json(body) => {
            serde_json::from_str(&body).map_err(|e| FetchError::UpstreamMalformed(e.to_string()))
        }
        Payload::Xml(body) => {
            let parsed = xml::xml_to_value(&body)
                .map_err(|e| FetchError::UpstreamMalformed(e.to_string()))?;
            Ok(parsed.get("standings").cloned().unwrap_or(parsed))
        }
    }
}

/// Upstream endpoints and the request timeout, taken from configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub upcoming_url: String,
    pub live_url: String,
    pub pointtable_base_url: String,
    pub pointtable_query_suffix: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn from_config(config: &Config) -> Self {
        UpstreamConfig {
            upcoming_url: config.upcoming_api_url.clone(),
            live_url: config.live_api_url.clone(),
            pointtable_base_url: config.pointtable_api_url.clone(),
            pointtable_query_suffix: config.pointtable_query_suffix.clone(),
            timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

/// The three fetch jobs, sharing one HTTP client and the snapshot store.
pub struct FetchJobs {
    http: Client,
    store: SnapshotStore,
    upstream: UpstreamConfig,
}

impl FetchJobs {
    pub fn new(store: SnapshotStore, upstream: UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(upstream.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FetchJobs {
            http,
            store,
            upstream,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    async fn fetch_body(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {}", url);
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::UpstreamStatus(resp.status()));
        }
        Ok(resp.text().await?)
    }

    /// One tick of a job: fetch, normalize, replace the snapshot. A failure
    /// at any step leaves the store untouched.
    async fn refresh(&self, key: SnapshotKey, url: &str) -> Result<Snapshot> {
        let body = self.fetch_body(url).await?;
        let data = normalize(classify(body))?;
        self.store.write(&key, data)
    }

    pub async fn refresh_upcoming(&self) -> Result<Snapshot> {
        self.refresh(SnapshotKey::Upcoming, &self.upstream.upcoming_url).await
    }

    pub async fn refresh_live(&self) -> Result<Snapshot> {
        self.refresh(SnapshotKey::Live, &self.upstream.live_url).await
    }

    pub async fn refresh_pointtable(&self, match_id: &str) -> Result<Snapshot> {
        let url = self.pointtable_url(match_id);
        self.refresh(SnapshotKey::PointTable(match_id.to_string()), &url).await
    }

    fn pointtable_url(&self, match_id: &str) -> String {
        format!(
            "{}{}{}",
            self.upstream.pointtable_base_url, match_id, self.upstream.pointtable_query_suffix
        )
    }
}
