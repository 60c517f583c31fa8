//! Tech news monitor: service entrypoint.
//! Boots the Axum HTTP server, wires shared state and, when enabled, the
//! background ingest scheduler.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use techstan_news_monitor::ingest::scheduler::spawn_scheduler;
use techstan_news_monitor::metrics::Metrics;
use techstan_news_monitor::{router, AppConfig, AppState};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,moderation=info,notify=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let state = AppState::from_config(&cfg)?;
    tracing::info!(
        sources = state.pipeline.sources().len(),
        interval = cfg.check_interval_minutes,
        scheduler = cfg.scheduler_enabled,
        "news monitor starting"
    );

    if cfg.scheduler_enabled {
        spawn_scheduler(
            state.pipeline.clone(),
            state.moderator.clone(),
            state.settings.clone(),
        );
    }

    let mut app = router(state);
    match Metrics::init(cfg.check_interval_minutes) {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    Ok(app.into())
}
