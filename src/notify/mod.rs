// src/notify/mod.rs
//! Operator notifications: a `Notifier` trait, the Telegram implementation,
//! a log-only fallback, and the message templates.
//!
//! Delivery is best-effort. Callers log failures and move on; nothing here is
//! retried or allowed to affect the moderation outcome.

pub mod telegram;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use html_escape::encode_text;
use metrics::counter;

use crate::config::AppConfig;
use crate::ingest::types::ArticleRecord;
use crate::moderation::ModerationEntry;

pub use telegram::TelegramNotifier;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Used when no bot token is configured: messages only go to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        tracing::info!(target: "notify", chat = chat_id, chars = text.chars().count(), "notification (log only)");
        Ok(())
    }
}

/// Telegram when a bot token is present, log-only otherwise.
pub fn notifier_from_config(cfg: &AppConfig) -> Arc<dyn Notifier> {
    match &cfg.bot_token {
        Some(token) => Arc::new(TelegramNotifier::new(
            cfg.telegram_api_base.clone(),
            token.clone(),
        )),
        None => {
            tracing::debug!(target: "notify", "Telegram disabled (no BOT_TOKEN)");
            Arc::new(LogNotifier)
        }
    }
}

/// Send and report success. Failures are logged and counted, never returned.
pub async fn deliver(notifier: &dyn Notifier, chat_id: &str, text: &str) -> bool {
    match notifier.send(chat_id, text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(target: "notify", error = %e, chat = chat_id, "notification failed");
            counter!("notify_failures_total").increment(1);
            false
        }
    }
}

fn fmt_time(ts: DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M UTC").to_string()
}

/// Summary posted to the moderation chat after an approval.
pub fn approval_summary(entry: &ModerationEntry, actor: &str, channel: &str) -> String {
    format!(
        "✅ <b>НОВОСТЬ ОДОБРЕНА</b>\n\n\
         🆔 ID: {}\n\
         📰 {}\n\
         ⏰ Время: {}\n\
         👤 Одобрено: {}\n\
         📢 Будет опубликовано в канале: {}",
        entry.id(),
        encode_text(entry.record().title()),
        fmt_time(entry.decided_at().unwrap_or_else(Utc::now)),
        encode_text(actor),
        encode_text(channel),
    )
}

/// Summary posted to the moderation chat after a rejection.
pub fn rejection_summary(entry: &ModerationEntry, actor: &str) -> String {
    format!(
        "❌ <b>НОВОСТЬ ОТКЛОНЕНА</b>\n\n\
         🆔 ID: {}\n\
         📰 {}\n\
         ⏰ Время: {}\n\
         👤 Отклонено: {}",
        entry.id(),
        encode_text(entry.record().title()),
        fmt_time(entry.decided_at().unwrap_or_else(Utc::now)),
        encode_text(actor),
    )
}

/// The post published to the channel for an approved record.
pub fn publication_post(record: &ArticleRecord) -> String {
    let mut out = format!("<b>{}</b>", encode_text(record.title()));
    if let Some(d) = record.description() {
        out.push_str("\n\n");
        out.push_str(&encode_text(d));
    }
    out.push_str(&format!(
        "\n\n🔗 <a href=\"{}\">Источник: {}</a>",
        html_escape::encode_double_quoted_attribute(record.link()),
        encode_text(record.source_name()),
    ));
    out
}

/// Digest of freshly queued entries for the moderation chat.
pub fn queued_summary(entries: &[ModerationEntry]) -> String {
    let mut out = format!("📰 <b>Новые новости на модерации: {}</b>\n", entries.len());
    for (i, e) in entries.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} ({}) [ID {}]",
            i + 1,
            encode_text(e.record().title()),
            encode_text(e.record().source_name()),
            e.id(),
        ));
    }
    out
}
