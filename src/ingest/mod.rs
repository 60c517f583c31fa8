// src/ingest/mod.rs
pub mod extract;
pub mod fetch;
pub mod scheduler;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::ingest::extract::{ExtractionCaps, Extractor, Strategy};
use crate::ingest::fetch::MarkupFetcher;
use crate::ingest::types::ArticleRecord;
use crate::relevance::Classifier;
use crate::sources::Source;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Batch runs started.");
        describe_counter!(
            "ingest_records_total",
            "Records kept after extraction + classification."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch failures, timeouts and worker crashes."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Extractions that fell back to the heading scan."
        );
        describe_counter!(
            "ingest_classification_miss_total",
            "Structural records dropped by the relevance classifier."
        );
        describe_histogram!("ingest_source_ms", "Per-source fetch + extract time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last batch finished.");
    });
}

/// Normalize text: decode entities, strip tags, unify quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tags regex"));
    // Tags go first so encoded brackets in text survive as literal characters.
    let stripped = re_tags.replace_all(s, " ");
    let mut out = html_escape::decode_html_entities(&stripped).to_string();

    // “ ” « » → ", ‘ ’ → '
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    let out = re_ws.replace_all(&out, " ");

    // Tag removal leaves spaces before punctuation ("<b>AI</b>, ..." → "AI , ...").
    static RE_PUNCT: OnceCell<regex::Regex> = OnceCell::new();
    let re_punct = RE_PUNCT.get_or_init(|| regex::Regex::new(r" ([,.;:!?])").expect("punct regex"));
    re_punct.replace_all(out.trim(), "$1").into_owned()
}

/// Per-source outcome of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub source: String,
    pub url: String,
    pub news_count: usize,
    pub success: bool,
    pub news: Vec<ArticleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    fn failed(source: &Source, error: impl Into<String>) -> Self {
        Self {
            source: source.name.clone(),
            url: source.base_url.clone(),
            news_count: 0,
            success: false,
            news: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub timestamp: DateTime<Utc>,
    pub total_news: usize,
    pub sources_parsed: usize,
    pub sources_successful: usize,
    pub results: Vec<SourceResult>,
    pub all_news: Vec<ArticleRecord>,
}

impl BatchReport {
    fn from_results(results: Vec<SourceResult>) -> Self {
        let all_news: Vec<ArticleRecord> = results.iter().flat_map(|r| r.news.clone()).collect();
        Self {
            timestamp: Utc::now(),
            total_news: all_news.len(),
            sources_parsed: results.len(),
            sources_successful: results.iter().filter(|r| r.success).count(),
            results,
            all_news,
        }
    }
}

/// Fetch → extract → classify for a set of sources.
#[derive(Clone)]
pub struct Pipeline {
    sources: Arc<Vec<Source>>,
    fetcher: Arc<dyn MarkupFetcher>,
    extractor: Arc<Extractor>,
    classifier: Arc<Classifier>,
    source_timeout: Duration,
}

impl Pipeline {
    /// The extractor is built from `classifier` with batch caps.
    pub fn new(
        sources: Vec<Source>,
        fetcher: Arc<dyn MarkupFetcher>,
        classifier: Arc<Classifier>,
        source_timeout: Duration,
    ) -> Self {
        let extractor = Arc::new(Extractor::new(classifier.clone(), ExtractionCaps::BATCH));
        Self {
            sources: Arc::new(sources),
            fetcher,
            extractor,
            classifier,
            source_timeout,
        }
    }

    /// Same pipeline with different extraction caps.
    pub fn with_caps(mut self, caps: ExtractionCaps) -> Self {
        self.extractor = Arc::new(self.extractor.with_caps(caps));
        self
    }

    /// Keep only the named source (case-insensitive). `None` when it is unknown.
    pub fn only(mut self, name: &str) -> Option<Self> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))?
            .clone();
        self.sources = Arc::new(vec![source]);
        Some(self)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Run every source in parallel. Always returns a report; failures are
    /// annotated per source and never abort siblings.
    pub async fn run_batch(&self) -> BatchReport {
        ensure_metrics_described();
        counter!("ingest_runs_total").increment(1);

        let handles: Vec<_> = self
            .sources
            .iter()
            .cloned()
            .map(|source| {
                let this = self.clone();
                let name = source.name.clone();
                let url = source.base_url.clone();
                let handle = tokio::spawn(async move { this.run_source(source).await });
                (name, url, handle)
            })
            .collect();

        // Merge after join; registry order is preserved.
        let mut results = Vec::with_capacity(handles.len());
        for (name, url, handle) in handles {
            let res = match handle.await {
                Ok(r) => r,
                Err(e) => {
                    warn!(target: "ingest", source = %name, error = %e, "source worker failed");
                    counter!("ingest_source_errors_total").increment(1);
                    SourceResult {
                        source: name,
                        url,
                        news_count: 0,
                        success: false,
                        news: Vec::new(),
                        error: Some(format!("worker failed: {e}")),
                    }
                }
            };
            results.push(res);
        }

        let report = BatchReport::from_results(results);
        counter!("ingest_records_total").increment(report.total_news as u64);
        gauge!("ingest_last_run_ts").set(report.timestamp.timestamp() as f64);
        info!(
            target: "ingest",
            total = report.total_news,
            sources = report.sources_parsed,
            ok = report.sources_successful,
            "batch finished"
        );
        report
    }

    /// One source under its hard timeout.
    pub async fn run_source(&self, source: Source) -> SourceResult {
        let t0 = Instant::now();
        let res = match tokio::time::timeout(self.source_timeout, self.fetch_and_extract(&source)).await {
            Ok(r) => r,
            Err(_) => {
                warn!(
                    target: "ingest",
                    source = %source.name,
                    timeout_ms = self.source_timeout.as_millis() as u64,
                    "source timed out"
                );
                counter!("ingest_source_errors_total").increment(1);
                SourceResult::failed(&source, "timed out")
            }
        };
        histogram!("ingest_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        res
    }

    async fn fetch_and_extract(&self, source: &Source) -> SourceResult {
        let fetched = self.fetcher.fetch(&source.base_url, self.source_timeout).await;
        if !fetched.ok {
            return SourceResult::failed(source, "fetch failed");
        }

        // Extraction is CPU-bound; off the runtime so the source timeout can fire.
        let extractor = self.extractor.clone();
        let src = source.clone();
        let body = fetched.body;
        let extraction =
            match tokio::task::spawn_blocking(move || extractor.extract(&body, &src)).await {
                Ok(ex) => ex,
                Err(e) => {
                    warn!(target: "ingest", source = %source.name, error = %e, "extraction failed");
                    counter!("ingest_source_errors_total").increment(1);
                    return SourceResult::failed(source, format!("extraction failed: {e}"));
                }
            };
        let strategy = extraction.strategy;
        let candidates = extraction.records.len();

        // Fallback records were already classified during extraction.
        let news: Vec<ArticleRecord> = match strategy {
            Strategy::HeadingFallback => extraction.records,
            Strategy::Structural => extraction
                .records
                .into_iter()
                .filter(|r| self.classifier.is_relevant(r.title()))
                .collect(),
        };
        let misses = candidates - news.len();
        if misses > 0 {
            counter!("ingest_classification_miss_total").increment(misses as u64);
        }

        info!(
            target: "ingest",
            source = %source.name,
            strategy = ?strategy,
            candidates,
            kept = news.len(),
            "source extracted"
        );

        SourceResult {
            source: source.name.clone(),
            url: source.base_url.clone(),
            news_count: news.len(),
            success: true,
            news,
            error: None,
        }
    }
}
