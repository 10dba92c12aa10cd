//! solrwatch - Solr statistics monitoring agent
//!
//! Samples the admin statistics of a running Solr server, derives latest
//! and incremental metric values, and publishes them on a fixed cycle.

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use solrwatch::{
    cli::Cli,
    client::SolrClient,
    config::Config,
    metrics::default_metrics,
    reporting::{LogSink, MetricSink, Reporter, WebhookSink},
    sampling::SamplingCache,
};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(cli).unwrap_or_else(|err| {
        // Manually initialize logger for this specific error
        env_logger::init();
        error!("Failed to load configuration: {}", err);
        // Exit if configuration fails, as it's a critical step.
        std::process::exit(1);
    });

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("solrwatch starting up...");

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Solr URL: {}", config.solr.url);
    info!("Minimum Refresh Pause: {}s", config.solr.min_pause_seconds);
    match config.solr.request_timeout_ms {
        Some(timeout) => info!("Request Timeout: {}ms", timeout),
        None => info!("Request Timeout: none"),
    }
    info!("Poll Interval: {}s", config.reporting.poll_interval_seconds);
    info!(
        "Webhook Sink: {}",
        if config.reporting.webhook_url.is_some() {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("-------------------------------------------------------");

    // =========================================================================
    // Create Shutdown Channel
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // =========================================================================
    // 1. Instantiate Services
    // =========================================================================
    let client = SolrClient::new(&config.solr.url, config.request_timeout())?;
    let cache = Arc::new(SamplingCache::new(Arc::new(client), config.min_pause()));

    // =========================================================================
    // 2. Setup Reporting Sinks
    // =========================================================================
    let mut sinks: Vec<Box<dyn MetricSink>> = Vec::new();
    sinks.push(Box::new(LogSink));
    if let Some(webhook_url) = &config.reporting.webhook_url {
        sinks.push(Box::new(WebhookSink::new(
            webhook_url.clone(),
            config.webhook_timeout(),
        )?));
    }

    // =========================================================================
    // 3. Start the Reporter
    // =========================================================================
    let reporter = Reporter::new(default_metrics(), cache, sinks);
    let reporter_task = tokio::spawn(reporter.run(config.poll_interval(), shutdown_rx));

    info!("solrwatch initialized successfully. Sampling statistics...");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    shutdown_tx.send(()).expect("Failed to send shutdown signal");

    if let Err(e) = reporter_task.await {
        error!("Reporter task panicked: {:?}", e);
    }

    info!("All tasks shut down. Exiting.");

    Ok(())
}
