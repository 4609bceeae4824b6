// src/snapshot.rs
//! On-disk snapshot files: payload shapes and the "write only if changed" step.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::ingest::types::{iso_millis, DeadlineEntry, Event, SourceHealth};
use crate::ingest::Collection;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventsSnapshot {
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
    pub timezone: String,
    pub events: Vec<Event>,
    pub highlights: Vec<String>,
    pub deadline_radar: Vec<DeadlineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcesSnapshot {
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
    pub sources: Vec<SourceHealth>,
}

impl EventsSnapshot {
    pub fn from_collection(c: &Collection, timezone: &str, updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            timezone: timezone.to_string(),
            events: c.events.clone(),
            highlights: c.highlights.clone(),
            deadline_radar: c.deadline_radar.clone(),
        }
    }
}

impl SourcesSnapshot {
    pub fn from_collection(c: &Collection, updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            sources: c.source_health.clone(),
        }
    }
}

/// Pretty-printed JSON, two-space indent.
pub fn render<T: Serialize>(payload: &T) -> Result<String> {
    serde_json::to_string_pretty(payload).context("serializing snapshot")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Changed,
    Unchanged,
}

impl WriteOutcome {
    pub fn changed(self) -> bool {
        matches!(self, WriteOutcome::Changed)
    }
}

/// Replace `path` with `content` unless it already holds exactly those bytes.
/// A missing file counts as different. The new content lands in a sibling temp
/// file first and is renamed into place.
pub async fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome> {
    match fs::read(path).await {
        Ok(existing) if existing == content.as_bytes() => return Ok(WriteOutcome::Unchanged),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("reading existing {}", path.display()));
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let tmp = temp_sibling(path);
    fs::write(&tmp, content.as_bytes())
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }

    Ok(WriteOutcome::Changed)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
