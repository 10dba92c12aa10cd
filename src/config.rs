//! Configuration management for solrwatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all agent settings. It uses the `figment`
//! crate to layer defaults, a `solrwatch.toml` file, environment
//! variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The main configuration struct for the agent.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the agent.
    pub log_level: String,
    /// Configuration for the monitored Solr server.
    pub solr: SolrConfig,
    /// Configuration for the reporting cycle and sinks.
    pub reporting: ReportingConfig,
}

/// Configuration for the monitored Solr server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SolrConfig {
    /// Base URL of the admin interface, e.g. `http://127.0.0.1:8080/solr`.
    pub url: String,
    /// Minimum spacing between outbound refreshes, in seconds. No matter
    /// how many metrics are read, the server is queried at most once per
    /// this interval.
    pub min_pause_seconds: u64,
    /// Optional network timeout for admin queries, in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

/// Configuration for the reporting cycle and sinks.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportingConfig {
    /// How often the metric table is evaluated and published, in seconds.
    pub poll_interval_seconds: u64,
    /// Optional HTTP endpoint that receives the JSON sample batches.
    pub webhook_url: Option<String>,
    /// Timeout for webhook publications, in seconds.
    pub webhook_timeout_seconds: u64,
}

impl Config {
    /// Loads the agent configuration by layering sources: defaults, TOML
    /// file, environment, and CLI arguments.
    pub fn load(cli: Cli) -> Result<Self> {
        let file = cli
            .config
            .clone()
            .unwrap_or_else(|| "solrwatch.toml".into());
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            // Allow overriding with environment variables, e.g.
            // SOLRWATCH_LOG_LEVEL=debug
            .merge(Env::prefixed("SOLRWATCH_"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }

    pub fn min_pause(&self) -> Duration {
        Duration::from_secs(self.solr.min_pause_seconds)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.solr.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.reporting.poll_interval_seconds)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.reporting.webhook_timeout_seconds)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            solr: SolrConfig {
                url: "http://127.0.0.1:8080/solr".to_string(),
                min_pause_seconds: 30,
                request_timeout_ms: None,
            },
            reporting: ReportingConfig {
                poll_interval_seconds: 60,
                webhook_url: None,
                webhook_timeout_seconds: 10,
            },
        }
    }
}
