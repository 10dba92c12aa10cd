//! HTTP client for the Solr admin interface
//!
//! Issues the two admin queries, decodes their XML payloads and assembles
//! a `Snapshot`. The handler statistics are the primary signal: a failure
//! of the system query only degrades the snapshot, it never fails the
//! whole fetch.

use crate::core::{AgentError, Snapshot, SnapshotSource};
use crate::response::{parse_handler_block, parse_system_block, StatsResponse, SystemResponse};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Client for one monitored Solr server.
pub struct SolrClient {
    http: reqwest::Client,
    base_url: String,
}

impl SolrClient {
    /// Creates a new client for the given base URL, e.g.
    /// `http://127.0.0.1:8080/solr`.
    ///
    /// # Arguments
    /// * `base_url` - Scheme, host, port and path prefix of the server.
    /// * `timeout` - Optional network timeout applied to every request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn stats_url(&self) -> String {
        format!("{}/admin/stats.jsp", self.base_url)
    }

    fn system_url(&self) -> String {
        format!("{}/admin/system/", self.base_url)
    }

    /// Issues one GET. A non-2xx status is "no data this cycle", not an
    /// error; only transport failures are.
    async fn get(&self, url: &str) -> Result<Option<String>, AgentError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| AgentError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            debug!("GET {} returned status {}", url, response.status());
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|source| AgentError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(Some(body))
    }

    /// Queries the handler/cache statistics and fills the snapshot with
    /// every recognized component block. Returns `false` when the primary
    /// endpoint had no data to offer this cycle.
    async fn fetch_handler_stats(&self, snapshot: &mut Snapshot) -> Result<bool, AgentError> {
        let url = self.stats_url();
        let body = match self.get(&url).await? {
            Some(body) => body,
            None => {
                warn!("Solr admin stats endpoint unavailable, no data this cycle");
                return Ok(false);
            }
        };

        let response: StatsResponse = quick_xml::de::from_str(&body)?;
        for entry in response.solr_info.entries() {
            if entry.kind().is_none() {
                continue;
            }
            snapshot.insert(parse_handler_block(entry));
        }
        Ok(true)
    }

    /// Queries the OS/JVM system information. All failures are swallowed;
    /// the snapshot simply proceeds without the system block.
    async fn fetch_system_info(&self, snapshot: &mut Snapshot) {
        let url = self.system_url();
        let body = match self.get(&url).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("system info endpoint unavailable, skipping system block");
                return;
            }
            Err(e) => {
                debug!("system info query failed: {}", e);
                return;
            }
        };

        let response: SystemResponse = match quick_xml::de::from_str(&body) {
            Ok(response) => response,
            Err(e) => {
                debug!("failed to decode system info payload: {}", e);
                return;
            }
        };

        match parse_system_block(&response) {
            Ok(block) => snapshot.insert(block),
            Err(e) => warn!("dropping system block: {}", e),
        }
    }
}

#[async_trait]
impl SnapshotSource for SolrClient {
    async fn fetch(&self) -> Result<Snapshot, AgentError> {
        let start = Instant::now();
        counter!("solr.fetch.attempts").increment(1);

        let mut snapshot = Snapshot::new();
        if !self.fetch_handler_stats(&mut snapshot).await? {
            return Ok(snapshot);
        }
        self.fetch_system_info(&mut snapshot).await;

        histogram!("solr.fetch.duration_seconds").record(start.elapsed().as_secs_f64());
        debug!("fetched snapshot with {} statistic blocks", snapshot.len());
        Ok(snapshot)
    }
}
