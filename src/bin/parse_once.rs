//! One-off ingest run printed as JSON. Nothing is queued or sent.
//!
//! Usage: `parse_once [SOURCE NAME]`. With a name, only that source is parsed
//! with the single-source caps.

use std::process::ExitCode;
use std::sync::Arc;

use techstan_news_monitor::ingest::extract::ExtractionCaps;
use techstan_news_monitor::ingest::fetch::HttpFetcher;
use techstan_news_monitor::relevance::Classifier;
use techstan_news_monitor::sources::SourceRegistry;
use techstan_news_monitor::{AppConfig, Pipeline};

async fn run() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cfg = AppConfig::from_env();
    let registry = SourceRegistry::load(cfg.sources_path.as_deref())?;
    let classifier = Arc::new(Classifier::load(cfg.relevance_path.as_deref())?);
    let mut pipeline = Pipeline::new(
        registry.sources().to_vec(),
        Arc::new(HttpFetcher::new()),
        classifier,
        cfg.source_timeout,
    );

    if let Some(name) = std::env::args().nth(1) {
        pipeline = match pipeline.only(&name) {
            Some(p) => p.with_caps(ExtractionCaps::SINGLE_SOURCE),
            None => {
                let known: Vec<&str> = registry.sources().iter().map(|s| s.name.as_str()).collect();
                eprintln!("unknown source '{name}'; known: {}", known.join(", "));
                return Ok(ExitCode::from(2));
            }
        };
    }

    let report = pipeline.run_batch().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("parse_once: {e:#}");
            ExitCode::FAILURE
        }
    }
}
