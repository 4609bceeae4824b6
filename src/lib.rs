// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::ingest::collect_events;
pub use crate::pipeline::{run, RunReport, NOOP_EXIT_CODE};
