// tests/metrics_ingest.rs
#![cfg(feature = "strict-metrics")]
use anyhow::Result;
use async_trait::async_trait;
use campus_feed_ingest::collect_events;
use campus_feed_ingest::ingest::config::default_sources;
use campus_feed_ingest::ingest::fetch::SourceFetcher;
use campus_feed_ingest::metrics::Metrics;

struct Down;

#[async_trait]
impl SourceFetcher for Down {
    async fn fetch_text(&self, _url: &str) -> Result<String> {
        anyhow::bail!("HTTP 502")
    }
}

#[tokio::test]
async fn metrics_exposed_after_ingest() {
    // Install a local recorder for the test
    let metrics = Metrics::init().expect("recorder");

    let _ = collect_events(&default_sources(), &Down, chrono::Utc::now()).await;

    // Scrape metrics text and check series presence by substring
    let out = metrics.render();
    assert!(out.contains("ingest_source_errors_total"));
    assert!(out.contains("ingest_seed_runs_total"));
    assert!(out.contains("ingest_kept_total"));

    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("textfile/ingest.prom");
    metrics.write_textfile(&p).await.unwrap();
    assert!(std::fs::read_to_string(&p).unwrap().contains("ingest_kept_total"));
}
