// src/ingest/normalize.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

use crate::ingest::types::{
    to_iso, Event, RawEventRecord, SourceDescriptor, DEFAULT_STATUS, UNKNOWN_LOCATION,
};

const UNTITLED: &str = "Untitled Event";

// Naive layouts, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%SZ",
    "%Y%m%dT%H%M%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parse a feed timestamp into a UTC instant. Offsets are honoured when present;
/// naive values are taken as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `<source id>-<12 hex chars>`; stable for the same title and start instant.
pub fn derive_event_id(source_id: &str, title: &str, start: &DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"-");
    hasher.update(to_iso(start).as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(source_id.len() + 13);
    out.push_str(source_id);
    out.push('-');
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Turn a raw record into a canonical event. Returns `None` when there is no
/// usable start time; that is the only reason a record is rejected.
pub fn normalize_event(
    raw: &RawEventRecord,
    source: &SourceDescriptor,
    now: DateTime<Utc>,
) -> Option<Event> {
    let start = raw.start.as_deref().and_then(parse_instant)?;
    let end = raw.end.as_deref().and_then(parse_instant).unwrap_or(start);

    let title = match raw.title.trim() {
        "" => UNTITLED.to_string(),
        t => t.to_string(),
    };
    let location = match raw.location.trim() {
        "" => UNKNOWN_LOCATION.to_string(),
        l => l.to_string(),
    };
    let status = match raw.status.trim() {
        "" => DEFAULT_STATUS.to_string(),
        s => s.to_lowercase(),
    };
    let url = match raw.url.trim() {
        "" => source.fallback_url.clone(),
        u => u.to_string(),
    };

    Some(Event {
        id: derive_event_id(&source.id, &title, &start),
        title,
        category: source.category.clone(),
        start,
        end,
        location,
        status,
        url,
        source: source.name.clone(),
        updated_at: now,
    })
}
