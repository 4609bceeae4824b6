// src/ingest/providers/ics.rs
//! Minimal iCalendar reader: RFC 5545 line unfolding, VEVENT grouping and the
//! date interpretation the snapshot needs. Recurrence rules and VTIMEZONE blocks are
//! not interpreted; components nested in a VEVENT (VALARM and the like) are skipped.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use metrics::{counter, histogram};

use crate::ingest::types::{
    to_iso, ParsedFeed, RawEventRecord, SourceDescriptor, DEFAULT_STATUS, UNKNOWN_LOCATION,
};

/// One property value as it appeared in a VEVENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsProperty {
    /// Everything between the property name and the first `:`, e.g. `TZID=America/Chicago`.
    pub params: String,
    pub value: String,
}

impl IcsProperty {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.split(';').find_map(|p| {
            let (k, v) = p.split_once('=')?;
            k.eq_ignore_ascii_case(key).then_some(v)
        })
    }
}

/// Properties of one VEVENT keyed by upper-cased name. Later duplicates overwrite earlier ones.
pub type IcsProperties = HashMap<String, IcsProperty>;

/// Reverse RFC 5545 folding: a line starting with a space or tab continues the previous one.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            continue;
        }
        let is_continuation = raw.starts_with([' ', '\t']);
        match out.last_mut() {
            Some(prev) if is_continuation => prev.push_str(raw.trim()),
            _ => out.push(raw.trim().to_string()),
        }
    }
    out
}

fn component_marker<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let (head, name) = line.split_once(':')?;
    head.trim().eq_ignore_ascii_case(keyword).then_some(name.trim())
}

/// Group unfolded lines into VEVENT property maps. Blocks without a non-empty
/// SUMMARY or without DTSTART are dropped. Properties of nested components
/// never reach the enclosing event.
pub fn parse_vevents(lines: &[String]) -> Vec<IcsProperties> {
    let mut events = Vec::new();
    let mut current: Option<IcsProperties> = None;
    // Open sub-components inside the current VEVENT.
    let mut nested = 0usize;

    for line in lines {
        if current.is_some() {
            if let Some(name) = component_marker(line, "BEGIN") {
                if !name.eq_ignore_ascii_case("VEVENT") {
                    nested += 1;
                    continue;
                }
            }
            if nested > 0 {
                if component_marker(line, "END").is_some() {
                    nested -= 1;
                }
                continue;
            }
        }
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(IcsProperties::new());
            nested = 0;
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(props) = current.take() {
                if is_well_formed(&props) {
                    events.push(props);
                }
            }
            continue;
        }
        let Some(props) = current.as_mut() else {
            continue;
        };
        let Some((head, value)) = line.split_once(':') else {
            continue;
        };
        let (name, params) = head.split_once(';').unwrap_or((head, ""));
        props.insert(
            name.trim().to_ascii_uppercase(),
            IcsProperty {
                params: params.to_string(),
                value: value.to_string(),
            },
        );
    }

    events
}

fn is_well_formed(props: &IcsProperties) -> bool {
    let has_summary = props
        .get("SUMMARY")
        .is_some_and(|p| !p.value.trim().is_empty());
    let has_start = props
        .get("DTSTART")
        .is_some_and(|p| !p.value.trim().is_empty());
    has_summary && has_start
}

/// Interpret an ICS date or date-time value as an ISO-8601 UTC instant.
///
/// `YYYYMMDD` is midnight UTC. `YYYYMMDDTHHMMSS[Z]` is read as UTC whatever the
/// `TZID` parameter says; no timezone database lookup happens here.
pub fn interpret_ics_date(value: &str, _tzid: Option<&str>) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if v.len() == 8 {
        let date = NaiveDate::parse_from_str(v, "%Y%m%d").ok()?;
        return Some(to_iso(&date.and_hms_opt(0, 0, 0)?.and_utc()));
    }
    let naive = v.strip_suffix('Z').unwrap_or(v);
    NaiveDateTime::parse_from_str(naive, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| to_iso(&dt.and_utc()))
}

fn interpret_property(props: &IcsProperties, name: &str) -> Option<String> {
    let p = props.get(name)?;
    interpret_ics_date(&p.value, p.param("TZID"))
}

fn trimmed(props: &IcsProperties, name: &str) -> Option<String> {
    props
        .get(name)
        .map(|p| p.value.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Map parsed VEVENTs onto the shared raw record shape.
pub fn to_raw_records(events: &[IcsProperties], source: &SourceDescriptor) -> Vec<RawEventRecord> {
    events
        .iter()
        .map(|props| {
            let start = interpret_property(props, "DTSTART");
            let end = interpret_property(props, "DTEND").or_else(|| start.clone());
            RawEventRecord {
                title: trimmed(props, "SUMMARY").unwrap_or_else(|| "Untitled".to_string()),
                start,
                end,
                location: trimmed(props, "LOCATION")
                    .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
                status: trimmed(props, "STATUS")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
                url: trimmed(props, "URL").unwrap_or_else(|| source.fallback_url.clone()),
                description: trimmed(props, "DESCRIPTION").unwrap_or_default(),
            }
        })
        .collect()
}

/// Parse a whole ICS document for `source`. ICS bodies never count as malformed:
/// anything unreadable simply yields no records.
pub fn parse(text: &str, source: &SourceDescriptor) -> ParsedFeed {
    let t0 = Instant::now();
    let lines = unfold_lines(text);
    let records = to_raw_records(&parse_vevents(&lines), source);

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_events_total").increment(records.len() as u64);
    ParsedFeed::ok(records)
}
