// src/api.rs
//! HTTP surface: ingest trigger, moderation queue, settings and stats.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shuttle_axum::axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::ingest::fetch::{HttpFetcher, MarkupFetcher};
use crate::ingest::scheduler::ingest_once;
use crate::ingest::types::Status;
use crate::ingest::{BatchReport, Pipeline};
use crate::moderation::{EntryId, ModerationEntry, ModerationError, ModerationStore, Moderator, StoreStats};
use crate::notify::{notifier_from_config, Notifier};
use crate::relevance::Classifier;
use crate::settings::{Settings, SettingsError, SettingsUpdate, SettingsView};
use crate::sources::SourceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub moderator: Arc<Moderator>,
    pub settings: Arc<Settings>,
    admin: Arc<AdminToken>,
}

impl AppState {
    /// Wire everything from config with explicit fetcher and notifier.
    pub fn build(
        cfg: &AppConfig,
        fetcher: Arc<dyn MarkupFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let registry = SourceRegistry::load(cfg.sources_path.as_deref())?;
        let classifier = Arc::new(Classifier::load(cfg.relevance_path.as_deref())?);
        let pipeline = Pipeline::new(
            registry.sources().to_vec(),
            fetcher,
            classifier,
            cfg.source_timeout,
        );
        let moderator = Moderator::new(
            Arc::new(ModerationStore::new(cfg.dedup_retention)),
            notifier,
            cfg.moderation_chat_id.clone(),
            cfg.publish_channel_id.clone(),
        );
        Ok(Self {
            pipeline,
            moderator: Arc::new(moderator),
            settings: Arc::new(Settings::in_memory(cfg)),
            admin: Arc::new(AdminToken::new(&cfg.admin_token)),
        })
    }

    /// Production wiring: HTTP fetcher, Telegram or log-only notifier.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Self::build(cfg, Arc::new(HttpFetcher::new()), notifier_from_config(cfg))
    }
}

/// Admin token kept only as its SHA-256 digest.
struct AdminToken {
    digest: [u8; 32],
}

impl AdminToken {
    fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }

    fn matches(&self, presented: &str) -> bool {
        let d: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        // Fixed-length fold, no early exit.
        d.iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Proof that the request carried `Authorization: Bearer <admin token>`.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        match presented {
            Some(t) if state.admin.matches(t) => Ok(AdminAuth),
            _ => {
                tracing::debug!(path = %parts.uri.path(), "admin auth rejected");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid admin token")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Moderation(#[from] ModerationError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Moderation(ModerationError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Moderation(ModerationError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "invalid_transition")
            }
            ApiError::Moderation(ModerationError::Duplicate { .. }) => (StatusCode::CONFLICT, "duplicate"),
            ApiError::Settings(_) => (StatusCode::BAD_REQUEST, "invalid_settings"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/parse", post(parse))
        .route("/news", get(list_news))
        .route("/news/approve", post(approve))
        .route("/news/reject", post(reject))
        .route("/settings", get(get_settings).post(save_settings))
        .route("/stats", get(stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ParseResp {
    message: String,
    queued: usize,
    duplicates: usize,
    #[serde(flatten)]
    report: BatchReport,
}

async fn parse(_auth: AdminAuth, State(state): State<AppState>) -> Json<ParseResp> {
    let (report, summary) = ingest_once(&state.pipeline, &state.moderator).await;
    Json(ParseResp {
        message: format!(
            "Found {} records from {}/{} sources; {} queued for moderation",
            report.total_news,
            report.sources_successful,
            report.sources_parsed,
            summary.queued.len()
        ),
        queued: summary.queued.len(),
        duplicates: summary.duplicates,
        report,
    })
}

#[derive(Deserialize)]
struct NewsQuery {
    status: Option<String>,
}

async fn list_news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<Vec<ModerationEntry>>, ApiError> {
    let filter = match q.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<Status>()
                .map_err(|_| ApiError::BadRequest(format!("unknown status '{raw}'")))?,
        ),
        None => None,
    };
    Ok(Json(state.moderator.list(filter)))
}

#[derive(Deserialize)]
struct NewsIdReq {
    #[serde(rename = "newsId")]
    news_id: EntryId,
    #[serde(default)]
    actor: Option<String>,
}

impl NewsIdReq {
    fn actor(&self) -> &str {
        self.actor.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or("admin")
    }
}

async fn approve(
    _auth: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<NewsIdReq>, JsonRejection>,
) -> Result<Json<ModerationEntry>, ApiError> {
    let Json(req) = body?;
    Ok(Json(state.moderator.approve(req.news_id, req.actor())?))
}

async fn reject(
    _auth: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<NewsIdReq>, JsonRejection>,
) -> Result<Json<ModerationEntry>, ApiError> {
    let Json(req) = body?;
    Ok(Json(state.moderator.reject(req.news_id, req.actor())?))
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    Json(state.settings.view())
}

async fn save_settings(
    _auth: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Json<SettingsView>, ApiError> {
    let Json(update) = body?;
    Ok(Json(state.settings.save(update)?))
}

#[derive(Serialize)]
struct StatsResp {
    #[serde(flatten)]
    store: StoreStats,
    last_check: Option<DateTime<Utc>>,
    check_interval: u32,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResp> {
    Json(StatsResp {
        store: state.moderator.stats(),
        last_check: state.moderator.last_batch(),
        check_interval: state.settings.check_interval(),
    })
}
