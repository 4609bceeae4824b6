// src/ingest/mod.rs
pub mod config;
pub mod fetch;
pub mod normalize;
pub mod providers;
pub mod seed;
pub mod types;

use crate::ingest::fetch::SourceFetcher;
use crate::ingest::types::{
    DeadlineEntry, Event, SourceDescriptor, SourceHealth, ACADEMIC_CATEGORY,
};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

pub const MAX_HIGHLIGHTS: usize = 3;
pub const MAX_DEADLINES: usize = 5;

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw records parsed from feeds.");
        describe_counter!(
            "ingest_kept_total",
            "Events kept after normalization + deduplication."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Records dropped by the normalizer (no usable start)."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Events removed as duplicate title + start."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch failures and malformed bodies."
        );
        describe_counter!(
            "ingest_seed_runs_total",
            "Runs that fell back to the synthetic seed."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| {
        regex::Regex::new(r"(?is)</?[a-z!][^>]*>").expect("tag regex is valid")
    });
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex is valid"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    out
}

/// Everything one source contributed to a run.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub events: Vec<Event>,
    pub health: SourceHealth,
}

/// Fetch, parse and normalize a single source. Never fails: transport errors and
/// malformed bodies end up in the returned health record.
pub async fn ingest_source(
    source: &SourceDescriptor,
    fetcher: &dyn SourceFetcher,
    now: DateTime<Utc>,
) -> SourceOutcome {
    let raw = match fetcher.fetch_text(&source.url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(source = %source.id, error = %format!("{e:#}"), "source fetch failed");
            counter!("ingest_source_errors_total").increment(1);
            return SourceOutcome {
                events: Vec::new(),
                health: SourceHealth::error(source, format!("{e:#}"), Utc::now()),
            };
        }
    };

    let parsed = providers::parse_body(&raw, source);
    if let Some(problem) = parsed.problem {
        counter!("ingest_source_errors_total").increment(1);
        return SourceOutcome {
            events: Vec::new(),
            health: SourceHealth::error(source, problem, Utc::now()),
        };
    }

    let parsed_count = parsed.records.len();
    let events: Vec<Event> = parsed
        .records
        .iter()
        .filter_map(|r| normalize::normalize_event(r, source, now))
        .collect();
    let dropped = parsed_count - events.len();
    counter!("ingest_dropped_total").increment(dropped as u64);

    tracing::info!(
        target: "ingest",
        source = %source.id,
        parsed = parsed_count,
        kept = events.len(),
        dropped,
        "source ingested"
    );

    let health = SourceHealth::ok(source, events.len(), Utc::now());
    SourceOutcome { events, health }
}

/// Keep the first event for every (title, start) pair, in input order.
/// Returns the survivors and how many were removed.
pub fn dedup_events(events: Vec<Event>) -> (Vec<Event>, usize) {
    let mut seen: HashSet<(String, DateTime<Utc>)> = HashSet::new();
    let mut keep = Vec::with_capacity(events.len());
    let mut dedup_out = 0usize;

    for ev in events {
        if !seen.insert((ev.title.clone(), ev.start)) {
            dedup_out += 1;
            continue;
        }
        keep.push(ev);
    }

    (keep, dedup_out)
}

/// Ids of the first upcoming events (start at or after `now`). Expects `events` sorted by start.
pub fn highlights(events: &[Event], now: DateTime<Utc>) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.start >= now)
        .take(MAX_HIGHLIGHTS)
        .map(|e| e.id.clone())
        .collect()
}

/// First academic events, projected for the deadline radar. Expects `events` sorted by start.
pub fn deadline_radar(events: &[Event]) -> Vec<DeadlineEntry> {
    events
        .iter()
        .filter(|e| e.category == ACADEMIC_CATEGORY)
        .take(MAX_DEADLINES)
        .map(|e| DeadlineEntry {
            id: e.id.clone(),
            title: e.title.clone(),
            date: e.start,
        })
        .collect()
}

/// Result of one full collection pass.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Deduplicated, ascending by start. Never empty.
    pub events: Vec<Event>,
    pub highlights: Vec<String>,
    pub deadline_radar: Vec<DeadlineEntry>,
    /// One entry per configured source, in configuration order.
    pub source_health: Vec<SourceHealth>,
    pub dedup_count: usize,
    pub seeded: bool,
}

/// Run every configured source, one at a time, and build the derived views.
pub async fn collect_events(
    sources: &[SourceDescriptor],
    fetcher: &dyn SourceFetcher,
    now: DateTime<Utc>,
) -> Collection {
    ensure_metrics_described();

    let mut all_events = Vec::new();
    let mut source_health = Vec::with_capacity(sources.len());
    for source in sources {
        let SourceOutcome { mut events, health } = ingest_source(source, fetcher, now).await;
        all_events.append(&mut events);
        source_health.push(health);
    }

    let (mut events, dedup_count) = dedup_events(all_events);
    let seeded = events.is_empty();
    if seeded {
        tracing::info!(target: "ingest", "no events from any source; using synthetic seed");
        counter!("ingest_seed_runs_total").increment(1);
        events = seed::synthetic_seed(now);
    }
    // Stable sort keeps feed order among equal starts.
    events.sort_by_key(|e| e.start);

    let highlights = highlights(&events, now);
    let deadline_radar = deadline_radar(&events);

    // Telemetry
    counter!("ingest_kept_total").increment(events.len() as u64);
    counter!("ingest_dedup_total").increment(dedup_count as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now.timestamp().max(0) as f64);

    Collection {
        events,
        highlights,
        deadline_radar,
        source_health,
        dedup_count,
        seeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ev(id: &str, title: &str, category: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            start,
            end: start,
            location: "TBD".into(),
            status: "scheduled".into(),
            url: "https://example.test".into(),
            source: "Test".into(),
            updated_at: start,
        }
    }

    #[test]
    fn normalize_text_strips_tags_and_collapses_ws() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>  ";
        assert_eq!(normalize_text(s), "Hello, world!");
    }

    #[test]
    fn normalize_text_leaves_quotes_and_length_alone() {
        let curly = "\u{201C}Tiger\u{201D} Walk \u{2018}25";
        assert_eq!(normalize_text(curly), curly);
        let long = "x".repeat(2_000);
        assert_eq!(normalize_text(&long).len(), 2_000);
    }

    #[test]
    fn normalize_text_keeps_comparisons() {
        assert_eq!(normalize_text("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn dedup_keeps_first_across_sources() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
        let evs = vec![
            ev("a-1", "Game", "Athletics", t),
            ev("b-1", "Game", "Campus", t),
            ev("a-2", "Game", "Athletics", t + Duration::hours(1)),
        ];
        let (kept, removed) = dedup_events(evs);
        assert_eq!(removed, 1);
        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "a-2"]);
    }

    #[test]
    fn highlights_take_upcoming_only_and_cap_at_three() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let evs: Vec<Event> = (-2..5)
            .map(|h| ev(&format!("e{h}"), &format!("E{h}"), "Campus", now + Duration::hours(h)))
            .collect();
        assert_eq!(highlights(&evs, now), vec!["e0", "e1", "e2"]);
    }

    #[test]
    fn radar_is_academic_only_and_capped() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut evs: Vec<Event> = (0..7)
            .map(|d| ev(&format!("a{d}"), "Deadline", ACADEMIC_CATEGORY, t + Duration::days(d)))
            .collect();
        evs.insert(0, ev("c0", "Tour", "Campus", t));
        let radar = deadline_radar(&evs);
        assert_eq!(radar.len(), MAX_DEADLINES);
        assert_eq!(radar[0].id, "a0");
        assert_eq!(radar[0].date, t);
    }
}
