// src/pipeline.rs
//! One complete run: collect, render both snapshots, persist what changed.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::ingest::collect_events;
use crate::ingest::config::IngestConfig;
use crate::ingest::fetch::SourceFetcher;
use crate::ingest::types::SourceStatus;
use crate::snapshot::{render, write_if_changed, EventsSnapshot, SourcesSnapshot};

/// Exit status telling the scheduler there was nothing new to persist.
pub const NOOP_EXIT_CODE: u8 = 78;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub events_changed: bool,
    pub sources_changed: bool,
    pub total_events: usize,
    pub highlights: usize,
    pub failed_sources: usize,
    pub seeded: bool,
    pub duration: Duration,
}

impl RunReport {
    /// Neither snapshot file changed.
    pub fn is_noop(&self) -> bool {
        !self.events_changed && !self.sources_changed
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_noop() {
            NOOP_EXIT_CODE
        } else {
            0
        }
    }
}

/// Run the pipeline once against `cfg`. Only persistence failures surface as `Err`.
pub async fn run(cfg: &IngestConfig, fetcher: &dyn SourceFetcher) -> Result<RunReport> {
    let t0 = Instant::now();
    let now = Utc::now();

    let collection = collect_events(&cfg.sources, fetcher, now).await;

    let events_payload = EventsSnapshot::from_collection(&collection, &cfg.timezone, Utc::now());
    let sources_payload = SourcesSnapshot::from_collection(&collection, Utc::now());

    let events_changed = write_if_changed(&cfg.events_path(), &render(&events_payload)?)
        .await?
        .changed();
    let sources_changed = write_if_changed(&cfg.sources_path(), &render(&sources_payload)?)
        .await?
        .changed();

    let report = RunReport {
        events_changed,
        sources_changed,
        total_events: collection.events.len(),
        highlights: collection.highlights.len(),
        failed_sources: collection
            .source_health
            .iter()
            .filter(|h| h.status == SourceStatus::Error)
            .count(),
        seeded: collection.seeded,
        duration: t0.elapsed(),
    };

    info!(
        events_written = report.events_changed,
        sources_written = report.sources_changed,
        "snapshots persisted"
    );
    info!(
        total_events = report.total_events,
        highlights = report.highlights,
        failed_sources = report.failed_sources,
        duration_ms = report.duration.as_millis() as u64,
        "run complete"
    );

    Ok(report)
}
