// src/ingest/fetch.rs
//! Markup fetch collaborator. Never errors past this boundary: failures come
//! back as an empty body with `ok = false`.

use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub body: String,
    pub ok: bool,
}

impl FetchOutcome {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ok: true,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait MarkupFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Live HTTP fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = ?e, "http client builder failed; using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    async fn try_fetch(&self, url: &str, timeout: Duration) -> anyhow::Result<String> {
        let rsp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(rsp.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarkupFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        match self.try_fetch(url, timeout).await {
            Ok(body) => FetchOutcome::ok(body),
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, %url, "fetch failed");
                counter!("ingest_source_errors_total").increment(1);
                FetchOutcome::failed()
            }
        }
    }
}

/// In-memory fetcher keyed by URL. Unknown URLs fail like an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }
}

#[async_trait]
impl MarkupFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        match self.pages.get(url) {
            Some(body) => FetchOutcome::ok(body.clone()),
            None => FetchOutcome::failed(),
        }
    }
}
