// src/config/app.rs
//! Process-wide configuration, resolved once at startup.
//!
//! This is the only place that reads environment variables. Components get
//! the values they need passed in at construction.

use std::path::PathBuf;
use std::time::Duration;

use crate::settings::{CHECK_INTERVAL_MAX, CHECK_INTERVAL_MIN};

pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";
pub const DEFAULT_RELEVANCE_CONFIG_PATH: &str = "config/relevance.toml";

pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_MODERATION_GROUP_ID: &str = "MODERATION_GROUP_ID";
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";
pub const ENV_ADMIN_TOKEN: &str = "ADMIN_TOKEN";
pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_DEDUP_RETENTION_HOURS: &str = "DEDUP_RETENTION_HOURS";
pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_RELEVANCE_CONFIG_PATH: &str = "RELEVANCE_CONFIG_PATH";
pub const ENV_TELEGRAM_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_SCHEDULER_ENABLED: &str = "SCHEDULER_ENABLED";

fn default_moderation_chat_id() -> String {
    "-4877957523".to_string()
}
fn default_publish_channel_id() -> String {
    "@techstannews".to_string()
}
fn default_admin_token() -> String {
    "techstan_admin_2024".to_string()
}

pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 30;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DEDUP_RETENTION_HOURS: i64 = 72;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token. `None` switches notifications to log-only.
    pub bot_token: Option<String>,
    pub moderation_chat_id: String,
    pub publish_channel_id: String,
    /// Bearer token required by mutating admin endpoints.
    pub admin_token: String,
    pub check_interval_minutes: u32,
    /// Hard per-source budget for fetch + extract.
    pub source_timeout: Duration,
    /// How long a decided entry keeps blocking resubmission of the same (title, source).
    pub dedup_retention: chrono::Duration,
    pub sources_path: Option<PathBuf>,
    pub relevance_path: Option<PathBuf>,
    pub telegram_api_base: String,
    pub scheduler_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            moderation_chat_id: default_moderation_chat_id(),
            publish_channel_id: default_publish_channel_id(),
            admin_token: default_admin_token(),
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            dedup_retention: chrono::Duration::hours(DEFAULT_DEDUP_RETENTION_HOURS),
            sources_path: None,
            relevance_path: None,
            telegram_api_base: "https://api.telegram.org".to_string(),
            scheduler_enabled: false,
        }
    }
}

impl AppConfig {
    /// Build from the process environment. Call `dotenvy::dotenv()` before this
    /// if a local `.env` should be honoured.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable or out-of-range values
    /// fall back to defaults (with a warning) instead of failing startup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        cfg.bot_token = get(ENV_BOT_TOKEN);
        if let Some(v) = get(ENV_MODERATION_GROUP_ID) {
            cfg.moderation_chat_id = v;
        }
        if let Some(v) = get(ENV_CHANNEL_ID) {
            cfg.publish_channel_id = v;
        }
        if let Some(v) = get(ENV_ADMIN_TOKEN) {
            cfg.admin_token = v;
        }

        if let Some(raw) = get(ENV_CHECK_INTERVAL) {
            match raw.parse::<u32>() {
                Ok(m) if (CHECK_INTERVAL_MIN..=CHECK_INTERVAL_MAX).contains(&m) => {
                    cfg.check_interval_minutes = m
                }
                _ => tracing::warn!(value = %raw, "ignoring invalid CHECK_INTERVAL"),
            }
        }
        if let Some(raw) = get(ENV_FETCH_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(s) if s > 0 => cfg.source_timeout = Duration::from_secs(s),
                _ => tracing::warn!(value = %raw, "ignoring invalid FETCH_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = get(ENV_DEDUP_RETENTION_HOURS) {
            match raw.parse::<i64>() {
                Ok(h) if h >= 0 => match chrono::Duration::try_hours(h) {
                    Some(d) => cfg.dedup_retention = d,
                    None => tracing::warn!(value = %raw, "DEDUP_RETENTION_HOURS out of range"),
                },
                _ => tracing::warn!(value = %raw, "ignoring invalid DEDUP_RETENTION_HOURS"),
            }
        }

        cfg.sources_path = resolve_path(get(ENV_SOURCES_CONFIG_PATH), DEFAULT_SOURCES_CONFIG_PATH);
        cfg.relevance_path =
            resolve_path(get(ENV_RELEVANCE_CONFIG_PATH), DEFAULT_RELEVANCE_CONFIG_PATH);

        if let Some(v) = get(ENV_TELEGRAM_API_BASE) {
            cfg.telegram_api_base = v.trim_end_matches('/').to_string();
        }
        cfg.scheduler_enabled = get(ENV_SCHEDULER_ENABLED)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        cfg
    }

    /// Bot token masked for display.
    pub fn masked_bot_token(&self) -> &'static str {
        if self.bot_token.is_some() {
            "***"
        } else {
            ""
        }
    }
}

/// Explicit path wins; otherwise use the default path only if it exists.
fn resolve_path(explicit: Option<String>, default: &str) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(PathBuf::from(p));
    }
    let p = PathBuf::from(default);
    p.exists().then_some(p)
}
