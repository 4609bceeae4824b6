pub mod athletics_json;
pub mod ics;

use crate::ingest::types::{FeedKind, ParsedFeed, SourceDescriptor};

/// Parse a fetched body with the parser matching the source's feed kind.
pub fn parse_body(raw: &str, source: &SourceDescriptor) -> ParsedFeed {
    match source.kind {
        FeedKind::Ics => ics::parse(raw, source),
        FeedKind::Json => athletics_json::adapt(raw, source),
    }
}
