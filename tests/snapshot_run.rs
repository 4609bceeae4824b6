// tests/snapshot_run.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use campus_feed_ingest::ingest::config::IngestConfig;
use campus_feed_ingest::ingest::fetch::SourceFetcher;
use campus_feed_ingest::ingest::types::{FeedKind, SourceDescriptor};
use campus_feed_ingest::snapshot::{
    write_if_changed, EventsSnapshot, SourcesSnapshot, WriteOutcome,
};
use campus_feed_ingest::{run, NOOP_EXIT_CODE};

const CAMPUS_ICS: &str = include_str!("fixtures/campus.ics");

struct CampusOnly;

#[async_trait]
impl SourceFetcher for CampusOnly {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        if url.ends_with("campus.ics") {
            Ok(CAMPUS_ICS.to_string())
        } else {
            Err(anyhow!("HTTP 404"))
        }
    }
}

fn config(dir: &std::path::Path) -> IngestConfig {
    IngestConfig {
        data_dir: dir.join("data"),
        sources: vec![
            SourceDescriptor {
                id: "athletics".into(),
                name: "Athletics".into(),
                kind: FeedKind::Json,
                url: "https://feeds.test/athletics.json".into(),
                category: "Athletics".into(),
                fallback_url: "https://feeds.test".into(),
            },
            SourceDescriptor {
                id: "campus".into(),
                name: "Campus".into(),
                kind: FeedKind::Ics,
                url: "https://feeds.test/campus.ics".into(),
                category: "Campus".into(),
                fallback_url: "https://feeds.test".into(),
            },
        ],
        ..IngestConfig::default()
    }
}

#[tokio::test]
async fn run_writes_both_snapshots() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());

    let report = run(&cfg, &CampusOnly).await.unwrap();
    assert!(report.events_changed && report.sources_changed);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.total_events, 2);
    assert_eq!(report.failed_sources, 1);

    let events: EventsSnapshot =
        serde_json::from_str(&std::fs::read_to_string(cfg.events_path()).unwrap()).unwrap();
    assert_eq!(events.timezone, "America/Chicago");
    assert_eq!(events.events.len(), 2);
    assert!(events.events.iter().all(|e| e.category == "Campus"));
    assert!(events.deadline_radar.is_empty());

    let raw_sources = std::fs::read_to_string(cfg.sources_path()).unwrap();
    let sources: SourcesSnapshot = serde_json::from_str(&raw_sources).unwrap();
    assert_eq!(sources.sources.len(), 2);
    assert_eq!(sources.sources[0].error.as_deref(), Some("HTTP 404"));
    assert_eq!(sources.sources[1].events, Some(2));

    // Wire names follow the snapshot contract.
    let v: serde_json::Value = serde_json::from_str(&raw_sources).unwrap();
    assert_eq!(v["sources"][0]["type"], "json");
    assert_eq!(v["sources"][0]["status"], "error");
    assert!(v["sources"][0].get("events").is_none());
    assert!(v["sources"][1].get("error").is_none());
}

#[tokio::test]
async fn identical_content_reports_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("data/lsu_events.json");
    let body = "{\n  \"events\": []\n}";

    assert_eq!(write_if_changed(&p, body).await.unwrap(), WriteOutcome::Changed);
    assert_eq!(write_if_changed(&p, body).await.unwrap(), WriteOutcome::Unchanged);
    assert_eq!(std::fs::read_to_string(&p).unwrap(), body);
}

#[tokio::test]
async fn unwritable_target_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the data directory should be.
    let blocker = tmp.path().join("data");
    std::fs::write(&blocker, "not a dir").unwrap();
    let cfg = config(tmp.path());

    assert!(run(&cfg, &CampusOnly).await.is_err());
}

#[test]
fn noop_code_is_78() {
    assert_eq!(NOOP_EXIT_CODE, 78);
}
