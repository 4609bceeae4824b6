//! Campus feed ingest — binary entrypoint.
//! Runs the pipeline once and exits 78 when neither snapshot changed.

use std::process::ExitCode;

use anyhow::Result;
use campus_feed_ingest::ingest::config::load_config_default;
use campus_feed_ingest::ingest::fetch::HttpFetcher;
use campus_feed_ingest::metrics::Metrics;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_feed_ingest=info,ingest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run() -> Result<u8> {
    let cfg = load_config_default()?;
    let metrics = match &cfg.metrics_path {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.timeout())?;
    let report = campus_feed_ingest::run(&cfg, &fetcher).await?;

    if let (Some(m), Some(path)) = (&metrics, &cfg.metrics_path) {
        // Metrics are best-effort; a failed dump must not change the exit status.
        if let Err(e) = m.write_textfile(path).await {
            tracing::warn!("metrics textfile: {e:#}");
        }
    }

    Ok(report.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("ingest run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
