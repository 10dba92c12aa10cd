//! End-to-end tests wiring the HTTP client, the sampling cache and the
//! metric descriptors against a mocked Solr admin interface.

use solrwatch::client::SolrClient;
use solrwatch::metrics::Metric;
use solrwatch::sampling::SamplingCache;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stats_xml(hits: u64, requests: u64) -> String {
    format!(
        r#"
        <solr>
          <solr-info>
            <QUERYHANDLER>
              <entry>
                <name>standard</name>
                <class>org.apache.solr.handler.component.SearchHandler</class>
                <stats>
                  <stat name="requests">{requests}</stat>
                  <stat name="avgTimePerRequest">3.5</stat>
                </stats>
              </entry>
            </QUERYHANDLER>
            <UPDATEHANDLER/>
            <CACHE>
              <entry>
                <name>queryResultCache</name>
                <class>org.apache.solr.search.LRUCache</class>
                <stats>
                  <stat name="hits">{hits}</stat>
                </stats>
              </entry>
            </CACHE>
          </solr-info>
        </solr>"#
    )
}

const SYSTEM_XML: &str = r#"
    <response>
      <lst name="jvm">
        <lst name="memory">
          <str name="used">512 MB</str>
        </lst>
      </lst>
      <lst name="system">
        <long name="freePhysicalMemorySize">890</long>
      </lst>
    </response>"#;

/// Mounts two consecutive stats payloads: the first mock is consumed by
/// the first refresh, later refreshes fall through to the second.
async fn mount_two_generations(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/solr/admin/stats.jsp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stats_xml(10, 100)))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/solr/admin/stats.jsp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stats_xml(17, 140)))
        .mount(server)
        .await;
}

fn cache_for(server: &MockServer) -> Arc<SamplingCache> {
    let client =
        SolrClient::new(&format!("{}/solr", server.uri()), Some(Duration::from_secs(5))).unwrap();
    Arc::new(SamplingCache::new(
        Arc::new(client),
        Duration::from_secs(30),
    ))
}

#[tokio::test]
async fn incremental_metrics_across_two_refresh_cycles() {
    let server = MockServer::start().await;
    mount_two_generations(&server).await;
    Mock::given(method("GET"))
        .and(path("/solr/admin/system/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SYSTEM_XML))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let hits = Metric::incremental("queryResultCache", "hits", "qrc hits", "hits/seconds");
    let latest_hits = Metric::latest("queryResultCache", "hits", "qrc hits now", "hits");
    let memory = Metric::latest("solr", "jvm_memory_used", "jvm used", "bytes");

    // First cycle: both generations alias the first snapshot.
    let t0 = Instant::now();
    assert_eq!(hits.evaluate(&cache, t0).await.unwrap(), 0.0);
    assert_eq!(latest_hits.evaluate(&cache, t0).await.unwrap(), 10.0);
    assert_eq!(memory.evaluate(&cache, t0).await.unwrap(), 536_870_912.0);

    // Second cycle, past the pause interval: a fresh snapshot rotates in.
    let t1 = t0 + Duration::from_secs(40);
    assert_eq!(hits.evaluate(&cache, t1).await.unwrap(), 7.0);
    assert_eq!(latest_hits.evaluate(&cache, t1).await.unwrap(), 17.0);

    // Six evaluations, but only two of them crossed the staleness
    // boundary: the server saw exactly two stats queries.
    let stats_queries = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/solr/admin/stats.jsp")
        .count();
    assert_eq!(stats_queries, 2);
}

#[tokio::test]
async fn burst_of_reads_shares_one_fetch() {
    let server = MockServer::start().await;
    mount_two_generations(&server).await;
    Mock::given(method("GET"))
        .and(path("/solr/admin/system/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let t0 = Instant::now();
    let metrics = [
        Metric::latest("standard", "requests", "standard requests", "requests"),
        Metric::latest("standard", "avgTimePerRequest", "standard tpr", "seconds"),
        Metric::incremental("queryResultCache", "hits", "qrc hits", "hits/seconds"),
    ];
    for metric in &metrics {
        metric.evaluate(&cache, t0).await.unwrap();
    }

    let stats_queries = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/solr/admin/stats.jsp")
        .count();
    assert_eq!(stats_queries, 1);
}

#[tokio::test]
async fn unreachable_system_endpoint_only_fails_system_metrics() {
    let server = MockServer::start().await;
    mount_two_generations(&server).await;
    Mock::given(method("GET"))
        .and(path("/solr/admin/system/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let t0 = Instant::now();

    let handler = Metric::latest("standard", "requests", "standard requests", "requests");
    assert_eq!(handler.evaluate(&cache, t0).await.unwrap(), 100.0);

    let memory = Metric::latest("solr", "jvm_memory_used", "jvm used", "bytes");
    assert!(matches!(
        memory.evaluate(&cache, t0).await,
        Err(solrwatch::AgentError::MissingBlock { .. })
    ));
}
