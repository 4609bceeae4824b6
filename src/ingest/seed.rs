// src/ingest/seed.rs
//! Placeholder events used when no source produced anything, so the snapshot
//! is never empty.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::{Event, ACADEMIC_CATEGORY};

pub const SEED_SOURCE: &str = "Synthetic Seed";

struct SeedSpec {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    start_offset: Duration,
    length: Duration,
    location: &'static str,
    status: &'static str,
    url: &'static str,
}

fn specs() -> [SeedSpec; 3] {
    [
        SeedSpec {
            id: "sample-athletics",
            title: "Sample: Baseball vs. Florida",
            category: "Athletics",
            start_offset: Duration::hours(1),
            length: Duration::hours(2),
            location: "Alex Box Stadium",
            status: "scheduled",
            url: "https://lsusports.net",
        },
        SeedSpec {
            id: "sample-campus",
            title: "Sample: Innovation Park Tour",
            category: "Campus",
            start_offset: Duration::hours(26),
            length: Duration::hours(2),
            location: "Patrick F. Taylor Hall",
            status: "scheduled",
            url: "https://calendar.lsu.edu",
        },
        SeedSpec {
            id: "sample-academic",
            title: "Sample: FAFSA Priority Deadline",
            category: ACADEMIC_CATEGORY,
            start_offset: Duration::days(5),
            length: Duration::hours(1),
            location: "Online",
            status: "deadline",
            url: "https://www.lsu.edu/academicaffairs",
        },
    ]
}

/// Three illustrative events, one per category, anchored to `now`.
pub fn synthetic_seed(now: DateTime<Utc>) -> Vec<Event> {
    specs()
        .into_iter()
        .map(|s| {
            let start = now + s.start_offset;
            Event {
                id: s.id.to_string(),
                title: s.title.to_string(),
                category: s.category.to_string(),
                start,
                end: start + s.length,
                location: s.location.to_string(),
                status: s.status.to_string(),
                url: s.url.to_string(),
                source: SEED_SOURCE.to_string(),
                updated_at: now,
            }
        })
        .collect()
}
