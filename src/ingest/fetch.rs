// src/ingest/fetch.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str = "goodknight-lsu-widget";

/// Downloads one feed body. Implementations must not retry.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a per-request deadline. reqwest drops the in-flight
/// connection when the deadline passes.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building http client")?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("request timed out after {:?}", self.timeout)
                } else {
                    anyhow!(e).context(format!("GET {url}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status.as_u16()));
        }

        resp.text()
            .await
            .with_context(|| format!("reading body of {url}"))
    }
}
