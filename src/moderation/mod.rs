// src/moderation/mod.rs
//! Moderation service: the store plus operator notifications.
//!
//! A decision is committed in the store first; the notifications that follow
//! are detached and their failures never undo or block the decision.

pub mod store;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ingest::types::{ArticleRecord, Status};
use crate::notify::{self, Notifier};

pub use store::{EntryId, ModerationEntry, ModerationError, ModerationStore, StoreStats};

/// Outcome of queuing a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitSummary {
    pub queued: Vec<EntryId>,
    pub duplicates: usize,
}

pub struct Moderator {
    store: Arc<ModerationStore>,
    notifier: Arc<dyn Notifier>,
    moderation_chat: String,
    publish_channel: String,
    last_batch: RwLock<Option<DateTime<Utc>>>,
}

impl Moderator {
    pub fn new(
        store: Arc<ModerationStore>,
        notifier: Arc<dyn Notifier>,
        moderation_chat: impl Into<String>,
        publish_channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            moderation_chat: moderation_chat.into(),
            publish_channel: publish_channel.into(),
            last_batch: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &ModerationStore {
        &self.store
    }

    pub fn submit(&self, record: ArticleRecord) -> Result<EntryId, ModerationError> {
        self.store.submit(record)
    }

    /// Queue every record; duplicates are counted and skipped. One digest goes
    /// to the moderation chat when anything new was queued.
    pub fn submit_all(&self, records: &[ArticleRecord]) -> SubmitSummary {
        let mut summary = SubmitSummary::default();
        for r in records {
            match self.store.submit(r.clone()) {
                Ok(id) => summary.queued.push(id),
                Err(ModerationError::Duplicate { existing }) => {
                    debug!(target: "moderation", existing, "duplicate skipped");
                    summary.duplicates += 1;
                }
                Err(e) => warn!(target: "moderation", error = %e, "submit failed"),
            }
        }

        if !summary.queued.is_empty() {
            let entries: Vec<ModerationEntry> = summary
                .queued
                .iter()
                .filter_map(|id| self.store.get(*id))
                .collect();
            self.dispatch(self.moderation_chat.clone(), notify::queued_summary(&entries));
        }
        summary
    }

    /// Pending → Published, then summary to the moderation chat and the post to the channel.
    pub fn approve(&self, id: EntryId, actor: &str) -> Result<ModerationEntry, ModerationError> {
        let entry = self.store.approve(id, actor)?;
        self.dispatch(
            self.moderation_chat.clone(),
            notify::approval_summary(&entry, actor, &self.publish_channel),
        );
        self.dispatch(self.publish_channel.clone(), notify::publication_post(entry.record()));
        Ok(entry)
    }

    pub fn reject(&self, id: EntryId, actor: &str) -> Result<ModerationEntry, ModerationError> {
        let entry = self.store.reject(id, actor)?;
        self.dispatch(
            self.moderation_chat.clone(),
            notify::rejection_summary(&entry, actor),
        );
        Ok(entry)
    }

    pub fn list(&self, filter: Option<Status>) -> Vec<ModerationEntry> {
        self.store.list(filter)
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats(Utc::now())
    }

    /// Remember when the last ingest batch finished.
    pub fn record_batch(&self, at: DateTime<Utc>) {
        let mut g = self.last_batch.write().unwrap_or_else(|e| e.into_inner());
        *g = Some(at);
    }

    pub fn last_batch(&self) -> Option<DateTime<Utc>> {
        *self.last_batch.read().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch(&self, chat: String, text: String) {
        let notifier = self.notifier.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    notify::deliver(notifier.as_ref(), &chat, &text).await;
                });
            }
            Err(_) => warn!(target: "notify", chat = %chat, "no runtime; notification dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;

    fn moderator() -> Moderator {
        Moderator::new(
            Arc::new(ModerationStore::new(chrono::Duration::hours(72))),
            Arc::new(LogNotifier),
            "-1",
            "@chan",
        )
    }

    fn rec(title: &str) -> ArticleRecord {
        ArticleRecord::new(title, "https://a.kz/x", "A").unwrap()
    }

    #[tokio::test]
    async fn submit_all_counts_duplicates() {
        let m = moderator();
        let batch = vec![rec("Стартап привлек инвестиции"), rec("Стартап привлек инвестиции")];
        let s = m.submit_all(&batch);
        assert_eq!(s.queued.len(), 1);
        assert_eq!(s.duplicates, 1);
    }

    #[tokio::test]
    async fn approve_then_reject_conflicts() {
        let m = moderator();
        let id = m.submit(rec("Новый AI сервис запущен")).unwrap();
        assert_eq!(m.approve(id, "admin").unwrap().status(), Status::Published);
        assert_eq!(
            m.reject(id, "admin").unwrap_err(),
            ModerationError::InvalidTransition { id, status: Status::Published }
        );
    }

    #[test]
    fn decisions_work_without_a_runtime() {
        let m = moderator();
        let id = m.submit(rec("Blockchain pilot in Tashkent")).unwrap();
        assert!(m.reject(id, "admin").is_ok());
        assert!(m.last_batch().is_none());
    }
}
