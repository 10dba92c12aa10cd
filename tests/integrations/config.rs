use clap::Parser;
use solrwatch::cli::Cli;
use solrwatch::config::Config;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    let path = file.path().to_path_buf();
    test_fn(path);
}

#[test]
fn test_defaults_without_config_file() {
    let cli = Cli::try_parse_from(["solrwatch"]).unwrap();
    let config = Config::load(cli).unwrap();

    assert_eq!(config.log_level, "info");
    assert_eq!(config.solr.url, "http://127.0.0.1:8080/solr");
    assert_eq!(config.solr.min_pause_seconds, 30);
    assert_eq!(config.solr.request_timeout_ms, None);
    assert_eq!(config.reporting.poll_interval_seconds, 60);
    assert_eq!(config.reporting.webhook_url, None);
}

#[test]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        [solr]
        url = "http://solr.internal:8983/solr"
        min_pause_seconds = 45
        request_timeout_ms = 2000
        [reporting]
        poll_interval_seconds = 120
        webhook_url = "http://collector.internal/ingest"
        webhook_timeout_seconds = 5
    "#;

    with_config_file(toml_content, |path| {
        let cli =
            Cli::try_parse_from(["solrwatch", "--config", path.to_str().unwrap()]).unwrap();
        let config = Config::load(cli).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.solr.url, "http://solr.internal:8983/solr");
        assert_eq!(config.solr.min_pause_seconds, 45);
        assert_eq!(config.solr.request_timeout_ms, Some(2000));
        assert_eq!(config.reporting.poll_interval_seconds, 120);
        assert_eq!(
            config.reporting.webhook_url.as_deref(),
            Some("http://collector.internal/ingest")
        );
        assert_eq!(config.reporting.webhook_timeout_seconds, 5);
    });
}

#[test]
fn test_cli_arguments_override_config_file() {
    let toml_content = r#"
        [solr]
        url = "http://solr.internal:8983/solr"
        min_pause_seconds = 45
    "#;

    with_config_file(toml_content, |path| {
        let cli = Cli::try_parse_from([
            "solrwatch",
            "--config",
            path.to_str().unwrap(),
            "--solr-url",
            "http://other:8080/solr",
            "--min-pause",
            "10",
            "--poll-interval",
            "15",
            "--verbose",
        ])
        .unwrap();
        let config = Config::load(cli).unwrap();

        assert_eq!(config.solr.url, "http://other:8080/solr");
        assert_eq!(config.solr.min_pause_seconds, 10);
        assert_eq!(config.reporting.poll_interval_seconds, 15);
        assert_eq!(config.log_level, "debug");
    });
}

#[test]
fn test_partial_config_keeps_remaining_defaults() {
    let toml_content = r#"
        [solr]
        url = "http://solr.internal:8983/solr"
    "#;

    with_config_file(toml_content, |path| {
        let cli =
            Cli::try_parse_from(["solrwatch", "--config", path.to_str().unwrap()]).unwrap();
        let config = Config::load(cli).unwrap();

        assert_eq!(config.solr.url, "http://solr.internal:8983/solr");
        assert_eq!(config.solr.min_pause_seconds, 30);
        assert_eq!(config.reporting.poll_interval_seconds, 60);
    });
}
