// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::ingest::types::{FeedKind, SourceDescriptor};

pub const ENV_CONFIG_PATH: &str = "CALENDAR_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "CALENDAR_DATA_DIR";

fn default_timezone() -> String {
    "America/Chicago".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_events_file() -> String {
    "lsu_events.json".to_string()
}
fn default_sources_file() -> String {
    "sources.json".to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// IANA label written into the events snapshot. No conversion is applied.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_events_file")]
    pub events_file: String,
    #[serde(default = "default_sources_file")]
    pub sources_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Where to drop the Prometheus text exposition after a run, if anywhere.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceDescriptor>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            data_dir: default_data_dir(),
            events_file: default_events_file(),
            sources_file: default_sources_file(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            metrics_path: None,
            sources: default_sources(),
        }
    }
}

impl IngestConfig {
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_file)
    }

    pub fn sources_path(&self) -> PathBuf {
        self.data_dir.join(&self.sources_file)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn sanitize(mut self) -> Result<Self> {
        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        validate_sources(&self.sources)?;
        Ok(self)
    }
}

/// The three LSU feeds the snapshot was built around.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            id: "athletics".into(),
            name: "LSU Athletics".into(),
            kind: FeedKind::Json,
            url: "https://lsusports.net/wp-json/lsusports/v1/events?per_page=100".into(),
            category: "Athletics".into(),
            fallback_url: "https://lsusports.net/sports".into(),
        },
        SourceDescriptor {
            id: "campus".into(),
            name: "LSU Campus Events".into(),
            kind: FeedKind::Ics,
            url: "https://calendar.lsu.edu/calendar.ics".into(),
            category: "Campus".into(),
            fallback_url: "https://calendar.lsu.edu".into(),
        },
        SourceDescriptor {
            id: "academic".into(),
            name: "LSU Academic Calendar".into(),
            kind: FeedKind::Ics,
            url: "https://www.lsu.edu/academicaffairs/resources/academic_calendar/icalendar/academic-calendar.ics".into(),
            category: "Academic".into(),
            fallback_url: "https://www.lsu.edu/academicaffairs/resources/academic_calendar/index.php".into(),
        },
    ]
}

pub fn validate_sources(sources: &[SourceDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for s in sources {
        if s.id.trim().is_empty() {
            bail!("source with empty id (name: {:?})", s.name);
        }
        if s.url.trim().is_empty() {
            bail!("source {:?} has an empty url", s.id);
        }
        if !seen.insert(s.id.as_str()) {
            bail!("duplicate source id {:?}", s.id);
        }
    }
    Ok(())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading calendar config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing calendar config {}", path.display()))?
        .sanitize()
}

/// Load config using env var + fallbacks:
/// 1) $CALENDAR_CONFIG_PATH
/// 2) config/calendar.toml
/// 3) config/calendar.json
/// 4) built-in defaults
///
/// `$CALENDAR_DATA_DIR` then overrides the output directory.
pub fn load_config_default() -> Result<IngestConfig> {
    let mut cfg = load_config_file_default()?;
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        if !dir.trim().is_empty() {
            cfg.data_dir = PathBuf::from(dir);
        }
    }
    Ok(cfg)
}

fn load_config_file_default() -> Result<IngestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("CALENDAR_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/calendar.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/calendar.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(IngestConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // No usable extension: JSON documents start with '{'.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_three_unique_sources() {
        let cfg = IngestConfig::default();
        assert_eq!(cfg.sources.len(), 3);
        assert!(validate_sources(&cfg.sources).is_ok());
        assert_eq!(cfg.timeout(), Duration::from_secs(15));
        assert_eq!(cfg.events_path(), PathBuf::from("data/lsu_events.json"));
    }

    #[test]
    fn toml_sources_override_defaults() {
        let toml = r#"
timezone = "America/New_York"
timeout_secs = 0

[[sources]]
id = "games"
name = "Games"
type = "json"
url = "https://example.test/games"
category = "Athletics"
fallback_url = "https://example.test"
"#;
        let cfg = parse_config(toml, "toml").unwrap().sanitize().unwrap();
        assert_eq!(cfg.timezone, "America/New_York");
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].kind, FeedKind::Json);
    }

    #[test]
    fn json_is_sniffed_without_extension() {
        let cfg = parse_config(r#"{"data_dir":"out"}"#, "").unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("out"));
        assert_eq!(cfg.sources.len(), 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut sources = default_sources();
        sources[1].id = "athletics".into();
        let err = validate_sources(&sources).unwrap_err();
        assert!(err.to_string().contains("duplicate source id"));
    }
}
