use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// Current exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the exposition text for a textfile collector to pick up.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(path, self.render())
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
