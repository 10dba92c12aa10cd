//! Reporting sinks and the periodic reporting loop
//!
//! On every reporting cycle the agent evaluates all configured metrics
//! against the shared sampling cache and publishes the surviving samples
//! to each sink. A metric that fails to evaluate is logged and skipped;
//! it never aborts the cycle or disturbs the other metrics.

use crate::metrics::Metric;
use crate::sampling::SamplingCache;
use async_trait::async_trait;
use log::{error, info, warn};
use metrics::counter;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::instrument;

/// One evaluated metric, ready for publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub units: String,
    pub value: f64,
}

/// Publishes batches of evaluated samples to a destination.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// A unique, descriptive name for the sink (e.g., "log", "webhook").
    fn name(&self) -> &str;

    /// Publishes one batch of samples.
    async fn publish(&self, samples: &[MetricSample]) -> anyhow::Result<()>;
}

/// Sink that writes each sample as a JSON line through the logger.
pub struct LogSink;

#[async_trait]
impl MetricSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, samples: &[MetricSample]) -> anyhow::Result<()> {
        for sample in samples {
            info!("{}", serde_json::to_string(sample)?);
        }
        Ok(())
    }
}

/// Sink that POSTs the batch as one JSON document to an HTTP endpoint.
pub struct WebhookSink {
    endpoint: String,
    http: reqwest::Client,
}

impl WebhookSink {
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint,
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl MetricSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, samples), fields(count = samples.len()))]
    async fn publish(&self, samples: &[MetricSample]) -> anyhow::Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let payload = json!({
            "agent": "solrwatch",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "samples": samples,
        });

        let response = self.http.post(&self.endpoint).json(&payload).send().await?;
        if response.status().is_success() {
            info!("Published {} samples to {}", samples.len(), self.endpoint);
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(
                "Failed to publish samples: status {}, body: {}",
                status, body
            );
            anyhow::bail!("webhook returned status {}", status)
        }
    }
}

/// Drives the reporting cycle: evaluate every metric, publish the batch.
pub struct Reporter {
    metrics: Vec<Metric>,
    cache: Arc<SamplingCache>,
    sinks: Vec<Box<dyn MetricSink>>,
}

impl Reporter {
    pub fn new(metrics: Vec<Metric>, cache: Arc<SamplingCache>, sinks: Vec<Box<dyn MetricSink>>) -> Self {
        Self {
            metrics,
            cache,
            sinks,
        }
    }

    /// Evaluates every configured metric once. Metrics that fail are
    /// logged and skipped so the rest of the cycle proceeds normally.
    pub async fn collect(&self, now: Instant) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            match metric.evaluate(&self.cache, now).await {
                Ok(value) => samples.push(MetricSample {
                    name: metric.name.to_string(),
                    units: metric.units.to_string(),
                    value,
                }),
                Err(e) => {
                    counter!("solr.report.skipped_metrics").increment(1);
                    warn!("Skipping metric {}: {}", metric.name, e);
                }
            }
        }
        samples
    }

    /// Runs the reporting loop until the shutdown signal fires.
    pub async fn run(self, poll_interval: Duration, mut shutdown_rx: watch::Receiver<()>) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(
            "Reporter started, publishing every {}s to {} sink(s)",
            poll_interval.as_secs(),
            self.sinks.len()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Reporter received shutdown signal.");
                    break;
                }
                _ = ticker.tick() => {
                    let samples = self.collect(Instant::now()).await;
                    if samples.is_empty() {
                        warn!("No metrics could be evaluated this cycle");
                        continue;
                    }
                    for sink in &self.sinks {
                        if let Err(e) = sink.publish(&samples).await {
                            error!("Sink {} failed to publish: {}", sink.name(), e);
                        }
                    }
                }
            }
        }
        info!("Reporter finished.");
    }
}
