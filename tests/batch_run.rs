// tests/batch_run.rs
//
// Batch runs over the seeded catalog with in-memory fetchers: isolation of
// failing and slow sources, registry ordering, report totals.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use techstan_news_monitor::ingest::fetch::{FetchOutcome, FixtureFetcher, MarkupFetcher};
use techstan_news_monitor::relevance::Classifier;
use techstan_news_monitor::sources::SourceRegistry;
use techstan_news_monitor::Pipeline;

const DIGITAL_BUSINESS: &str = r#"
<div class="post"><h2><a href="/a/1">Стартап из Алматы привлек инвестиции</a></h2></div>
<div class="post"><h2><a href="/a/2">Погода на выходные будет солнечной</a></h2></div>"#;

const THE_TECH: &str = r#"
<article><h3><a href="https://the-tech.kz/ai">AI assistant launched for Kazakh banks</a></h3></article>"#;

fn pipeline(fetcher: Arc<dyn MarkupFetcher>, timeout: Duration) -> Pipeline {
    Pipeline::new(
        SourceRegistry::default_seed().sources().to_vec(),
        fetcher,
        Arc::new(Classifier::default()),
        timeout,
    )
}

#[tokio::test]
async fn failing_sources_do_not_abort_siblings() {
    let fetcher = FixtureFetcher::new()
        .with_page("https://digitalbusiness.kz/", DIGITAL_BUSINESS)
        .with_page("https://the-tech.kz/", THE_TECH);
    let report = pipeline(Arc::new(fetcher), Duration::from_secs(5)).run_batch().await;

    assert_eq!(report.sources_parsed, 4);
    assert_eq!(report.sources_successful, 2);
    assert_eq!(report.total_news, 2);
    assert_eq!(report.all_news.len(), report.total_news);

    let names: Vec<&str> = report.results.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(names, ["Digital Business", "Spot.uz", "The Tech", "Blue Screen"]);

    let spot = &report.results[1];
    assert!(!spot.success);
    assert_eq!(spot.error.as_deref(), Some("fetch failed"));
    assert!(spot.news.is_empty());

    // Irrelevant structural record is dropped by the classifier.
    assert_eq!(report.results[0].news_count, 1);
    assert_eq!(
        report.results[0].news[0].link(),
        "https://digitalbusiness.kz/a/1"
    );
}

struct SlowFetcher;

#[async_trait]
impl MarkupFetcher for SlowFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        if url.contains("spot.uz") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        FetchOutcome::ok(THE_TECH)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_alone() {
    let report = pipeline(Arc::new(SlowFetcher), Duration::from_secs(15)).run_batch().await;

    let spot = report.results.iter().find(|r| r.source == "Spot.uz").unwrap();
    assert!(!spot.success);
    assert_eq!(spot.error.as_deref(), Some("timed out"));
    assert_eq!(report.sources_successful, 3);
}

#[tokio::test]
async fn every_source_failing_still_returns_a_report() {
    let report = pipeline(Arc::new(FixtureFetcher::new()), Duration::from_secs(1))
        .run_batch()
        .await;
    assert_eq!(report.sources_parsed, 4);
    assert_eq!(report.sources_successful, 0);
    assert_eq!(report.total_news, 0);

    let v = serde_json::to_value(&report).unwrap();
    for key in ["timestamp", "total_news", "sources_parsed", "sources_successful", "results", "all_news"] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn single_source_mode_uses_only_the_named_source() {
    let fetcher = FixtureFetcher::new().with_page("https://the-tech.kz/", THE_TECH);
    let p = pipeline(Arc::new(fetcher), Duration::from_secs(5))
        .only("the tech")
        .expect("known source");
    let report = p.run_batch().await;
    assert_eq!(report.sources_parsed, 1);
    assert_eq!(report.total_news, 1);

    assert!(pipeline(Arc::new(FixtureFetcher::new()), Duration::from_secs(1))
        .only("nope")
        .is_none());
}

fn unclosed_page(items: usize) -> String {
    let mut html = String::from("<ul>");
    for i in 0..items {
        html.push_str(&format!(
            "<li class=\"news-item\"><h2><a href=\"/n/{i}\">Стартап номер {i:05} в Алматы</a></h2><p>Подробности"
        ));
    }
    html
}

#[tokio::test]
async fn source_timeout_covers_extraction() {
    let fetcher = FixtureFetcher::new().with_page("https://spot.uz/", &unclosed_page(20_000));
    let p = pipeline(Arc::new(fetcher), Duration::from_millis(1))
        .only("Spot.uz")
        .expect("seeded source");
    let report = p.run_batch().await;
    let spot = &report.results[0];
    assert!(!spot.success);
    assert_eq!(spot.error.as_deref(), Some("timed out"));
}

#[tokio::test]
async fn large_page_of_unclosed_containers_extracts_within_budget() {
    let fetcher = FixtureFetcher::new().with_page("https://spot.uz/", &unclosed_page(12_000));
    let p = pipeline(Arc::new(fetcher), Duration::from_secs(30))
        .only("Spot.uz")
        .expect("seeded source");
    let t0 = std::time::Instant::now();
    let report = p.run_batch().await;
    assert!(t0.elapsed() < Duration::from_secs(10), "took {:?}", t0.elapsed());

    let spot = &report.results[0];
    assert!(spot.success);
    assert_eq!(spot.news_count, 5);
    assert_eq!(spot.news[0].link(), "https://spot.uz/n/0");
}
