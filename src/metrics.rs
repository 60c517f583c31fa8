// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init(check_interval_minutes: u32) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!(
            "moderation_transitions_total",
            "Moderation decisions, labelled by resulting status."
        );
        describe_counter!(
            "moderation_conflicts_total",
            "Transitions refused because the entry was already decided."
        );
        describe_counter!("notify_failures_total", "Notifications that could not be delivered.");

        // Interval at startup; later changes come through /settings.
        gauge!("ingest_check_interval_minutes").set(f64::from(check_interval_minutes));

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
