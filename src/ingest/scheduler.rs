// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ingest::{BatchReport, Pipeline};
use crate::moderation::{Moderator, SubmitSummary};
use crate::settings::Settings;

/// One batch: run every source, queue the relevant records for moderation.
pub async fn ingest_once(pipeline: &Pipeline, moderator: &Moderator) -> (BatchReport, SubmitSummary) {
    let report = pipeline.run_batch().await;
    let summary = moderator.submit_all(&report.all_news);
    moderator.record_batch(report.timestamp);
    tracing::info!(
        target: "ingest",
        found = report.total_news,
        queued = summary.queued.len(),
        duplicates = summary.duplicates,
        "ingest tick"
    );
    (report, summary)
}

/// Run a batch now, then again every `check_interval` minutes. The interval is
/// re-read after each run so saved settings apply from the next sleep on.
pub fn spawn_scheduler(
    pipeline: Pipeline,
    moderator: Arc<Moderator>,
    settings: Arc<Settings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            ingest_once(&pipeline, &moderator).await;
            let minutes = settings.check_interval();
            tracing::debug!(target: "ingest", minutes, "next ingest scheduled");
            tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::ingest::fetch::FixtureFetcher;
    use crate::moderation::ModerationStore;
    use crate::notify::LogNotifier;
    use crate::relevance::Classifier;
    use crate::sources::SourceRegistry;

    fn pipeline(markup: &str) -> Pipeline {
        let reg = SourceRegistry::default_seed();
        let first = reg.sources()[0].clone();
        let fetcher = FixtureFetcher::new().with_page(&first.base_url, markup);
        Pipeline::new(
            vec![first],
            Arc::new(fetcher),
            Arc::new(Classifier::default()),
            Duration::from_secs(2),
        )
    }

    fn moderator() -> Arc<Moderator> {
        Arc::new(Moderator::new(
            Arc::new(ModerationStore::new(chrono::Duration::hours(72))),
            Arc::new(LogNotifier),
            "-1",
            "@c",
        ))
    }

    #[tokio::test]
    async fn second_run_only_finds_duplicates() {
        let p = pipeline(r#"<article><h2><a href="/a">Стартап из Алматы привлек инвестиции</a></h2></article>"#);
        let m = moderator();
        let (report, first) = ingest_once(&p, &m).await;
        assert_eq!(report.total_news, 1);
        assert_eq!(first.queued.len(), 1);
        let (_, second) = ingest_once(&p, &m).await;
        assert!(second.queued.is_empty());
        assert_eq!(second.duplicates, 1);
        assert!(m.last_batch().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_runs_immediately() {
        let p = pipeline("<h2>Hello World</h2>");
        let m = moderator();
        let s = Arc::new(Settings::in_memory(&AppConfig::default()));
        let h = spawn_scheduler(p, m.clone(), s);
        for _ in 0..50 {
            if m.last_batch().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(m.last_batch().is_some());
        h.abort();
    }
}
