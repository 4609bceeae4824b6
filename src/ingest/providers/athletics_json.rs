// src/ingest/providers/athletics_json.rs
use std::time::Instant;

use chrono::DateTime;
use metrics::{counter, histogram};
use serde_json::Value;

use crate::ingest::normalize_text;
use crate::ingest::types::{
    to_iso, ParsedFeed, RawEventRecord, SourceDescriptor, DEFAULT_STATUS, UNKNOWN_LOCATION,
};

// Ordered fallback chains (JSON pointers). The first non-empty string wins.
const TITLE_FIELDS: &[&str] = &["/title/rendered", "/post_title", "/title"];
const START_FIELDS: &[&str] = &["/event_start", "/start_time"];
const END_FIELDS: &[&str] = &["/event_end", "/end_time", "/event_start"];
const LOCATION_FIELDS: &[&str] = &["/venue/title", "/location"];
const STATUS_FIELDS: &[&str] = &["/status"];
const URL_FIELDS: &[&str] = &["/link", "/permalink"];
const DESCRIPTION_FIELDS: &[&str] = &["/excerpt/rendered"];

fn first_present(item: &Value, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|ptr| {
        item.pointer(ptr)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Like `first_present`, but a candidate only counts once markup is stripped.
fn first_present_text(item: &Value, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|ptr| {
        item.pointer(ptr)
            .and_then(Value::as_str)
            .map(normalize_text)
            .filter(|s| !s.is_empty())
    })
}

/// Timestamps may be strings or epoch milliseconds.
fn first_timestamp(item: &Value, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|ptr| match item.pointer(ptr)? {
        Value::String(s) => Some(s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| to_iso(&dt)),
        _ => None,
    })
}

fn to_raw(item: &Value, source: &SourceDescriptor) -> RawEventRecord {
    let title = first_present_text(item, TITLE_FIELDS)
        .unwrap_or_else(|| format!("{} Event", source.name));

    RawEventRecord {
        title,
        start: first_timestamp(item, START_FIELDS),
        end: first_timestamp(item, END_FIELDS),
        location: first_present(item, LOCATION_FIELDS)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        status: first_present(item, STATUS_FIELDS)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        url: first_present(item, URL_FIELDS).unwrap_or_else(|| source.fallback_url.clone()),
        description: first_present_text(item, DESCRIPTION_FIELDS).unwrap_or_default(),
    }
}

/// Adapt an athletics-style JSON body (an array of game objects) into raw records.
///
/// Never fails: an undecodable body or a non-array root yields no records and a
/// `problem` describing why.
pub fn adapt(raw: &str, source: &SourceDescriptor) -> ParsedFeed {
    let t0 = Instant::now();

    let root: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(source = %source.id, error = %e, "failed to parse feed JSON");
            return ParsedFeed::malformed(format!("invalid JSON: {e}"));
        }
    };
    let Some(items) = root.as_array() else {
        tracing::warn!(source = %source.id, "feed JSON root is not an array");
        return ParsedFeed::malformed("expected a JSON array of events");
    };

    let records: Vec<RawEventRecord> = items.iter().map(|it| to_raw(it, source)).collect();

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_events_total").increment(records.len() as u64);
    ParsedFeed::ok(records)
}
