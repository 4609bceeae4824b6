// src/ingest/types.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Category label whose events feed the deadline radar.
pub const ACADEMIC_CATEGORY: &str = "Academic";

/// Location used whenever a feed does not provide one.
pub const UNKNOWN_LOCATION: &str = "TBD";

/// Status used whenever a feed does not provide one.
pub const DEFAULT_STATUS: &str = "scheduled";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Ics,
    Json,
}

/// Static description of one upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub url: String,
    pub category: String,
    /// Shown when an individual event carries no URL of its own.
    pub fallback_url: String,
}

/// Parser output shared by the ICS and JSON paths. Timestamps stay as text here;
/// the normalizer decides whether they are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEventRecord {
    pub title: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: String,
    pub status: String,
    pub url: String,
    pub description: String,
}

/// Records parsed from one feed body plus anything worth reporting about the body itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub records: Vec<RawEventRecord>,
    /// Set when the body could not be read as the expected shape.
    pub problem: Option<String>,
}

impl ParsedFeed {
    pub fn ok(records: Vec<RawEventRecord>) -> Self {
        Self {
            records,
            problem: None,
        }
    }

    pub fn malformed(problem: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            problem: Some(problem.into()),
        }
    }
}

/// Canonical event as persisted in the events snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
    pub location: String,
    pub status: String,
    pub url: String,
    pub source: String,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Error,
}

/// Outcome of one source for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceHealth {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub url: String,
    pub category: String,
    pub status: SourceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<usize>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::option"
    )]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::option"
    )]
    pub last_failure: Option<DateTime<Utc>>,
}

impl SourceHealth {
    pub fn ok(source: &SourceDescriptor, events: usize, at: DateTime<Utc>) -> Self {
        Self {
            status: SourceStatus::Ok,
            events: Some(events),
            last_success: Some(at),
            ..Self::blank(source)
        }
    }

    pub fn error(source: &SourceDescriptor, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: SourceStatus::Error,
            error: Some(error.into()),
            last_failure: Some(at),
            ..Self::blank(source)
        }
    }

    fn blank(source: &SourceDescriptor) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            kind: source.kind,
            url: source.url.clone(),
            category: source.category.clone(),
            status: SourceStatus::Error,
            events: None,
            last_success: None,
            error: None,
            last_failure: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeadlineEntry {
    pub id: String,
    pub title: String,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
}

/// Formats an instant the way the snapshot files carry it: `2025-02-15T19:00:00.000Z`.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_iso(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            raw.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}
