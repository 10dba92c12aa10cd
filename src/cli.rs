//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the agent using the
//! `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `solrwatch.toml` file and environment
//! variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// A monitoring agent that samples Solr admin statistics and reports
/// latest and incremental metric values.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the monitored Solr admin interface.
    #[arg(long, value_name = "URL")]
    pub solr_url: Option<String>,

    /// Minimum spacing between outbound refreshes in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub min_pause: Option<u64>,

    /// Reporting cycle length in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// HTTP endpoint that receives the JSON sample batches.
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Verbose mode (debug-level logging).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        let mut solr = Dict::new();
        let mut reporting = Dict::new();

        if let Some(url) = &self.solr_url {
            solr.insert("url".into(), Value::from(url.clone()));
        }

        if let Some(pause) = self.min_pause {
            solr.insert("min_pause_seconds".into(), Value::from(pause));
        }

        if let Some(interval) = self.poll_interval {
            reporting.insert("poll_interval_seconds".into(), Value::from(interval));
        }

        if let Some(url) = &self.webhook_url {
            reporting.insert("webhook_url".into(), Value::from(url.clone()));
        }

        if self.verbose {
            dict.insert("log_level".into(), Value::from("debug"));
        }

        if !solr.is_empty() {
            dict.insert("solr".into(), solr.into());
        }

        if !reporting.is_empty() {
            dict.insert("reporting".into(), reporting.into());
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
