// src/moderation/store.rs
//! In-memory moderation state machine.
//!
//! Pending → Published | Rejected, at most once. The store is the only writer
//! of an entry's status; concurrent transitions on the same id are settled by
//! the lock: the first one wins, the second sees a terminal entry.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info};

use crate::ingest::types::{ArticleRecord, Status};

pub type EntryId = u64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModerationError {
    #[error("entry {0} not found")]
    NotFound(EntryId),
    #[error("entry {id} is already {}", .status.as_str())]
    InvalidTransition { id: EntryId, status: Status },
    #[error("duplicate of entry {existing}")]
    Duplicate { existing: EntryId },
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationEntry {
    id: EntryId,
    #[serde(flatten)]
    record: ArticleRecord,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<String>,
}

impl ModerationEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }
    pub fn record(&self) -> &ArticleRecord {
        &self.record
    }
    pub fn status(&self) -> Status {
        self.record.status()
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }
    pub fn decided_by(&self) -> Option<&str> {
        self.decided_by.as_deref()
    }

    /// Terminal and decided before `cutoff`.
    fn expired(&self, cutoff: DateTime<Utc>) -> bool {
        self.status().is_terminal() && self.decided_at.is_some_and(|t| t < cutoff)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_parsed: u64,
    pub pending_count: usize,
    pub published_count: usize,
    pub rejected_count: usize,
    pub parsed_today: usize,
    pub published_today: usize,
    pub rejected_today: usize,
}

#[derive(Debug)]
struct Inner {
    next_id: EntryId,
    // Ids are monotonic, so key order is insertion order.
    entries: BTreeMap<EntryId, ModerationEntry>,
}

#[derive(Debug)]
pub struct ModerationStore {
    inner: Mutex<Inner>,
    retention: Duration,
}

impl ModerationStore {
    /// `retention`: how long a decided entry keeps blocking resubmission.
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                entries: BTreeMap::new(),
            }),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn submit(&self, record: ArticleRecord) -> Result<EntryId, ModerationError> {
        self.submit_at(record, Utc::now())
    }

    /// Queue a record as Pending unless the same (title, source) is still on file.
    pub fn submit_at(
        &self,
        mut record: ArticleRecord,
        now: DateTime<Utc>,
    ) -> Result<EntryId, ModerationError> {
        let mut inner = self.lock();
        self.purge_locked(&mut inner, now);

        if let Some(existing) = inner
            .entries
            .values()
            .find(|e| e.record.identity() == record.identity())
        {
            counter!("moderation_conflicts_total").increment(1);
            debug!(target: "moderation", existing = existing.id, "duplicate submit");
            return Err(ModerationError::Duplicate {
                existing: existing.id,
            });
        }

        let id = inner.next_id;
        inner.next_id += 1;
        record.set_status(Status::Pending);
        inner.entries.insert(
            id,
            ModerationEntry {
                id,
                record,
                created_at: now,
                decided_at: None,
                decided_by: None,
            },
        );
        debug!(target: "moderation", id, "entry queued");
        Ok(id)
    }

    pub fn approve(&self, id: EntryId, actor: &str) -> Result<ModerationEntry, ModerationError> {
        self.transition(id, Status::Published, actor, Utc::now())
    }

    pub fn reject(&self, id: EntryId, actor: &str) -> Result<ModerationEntry, ModerationError> {
        self.transition(id, Status::Rejected, actor, Utc::now())
    }

    /// Move a Pending entry to the terminal `target`. Returns the updated entry.
    pub fn transition(
        &self,
        id: EntryId,
        target: Status,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ModerationEntry, ModerationError> {
        debug_assert!(target.is_terminal());
        let mut inner = self.lock();
        let entry = inner
            .entries
            .get_mut(&id)
            .ok_or(ModerationError::NotFound(id))?;
        if entry.status().is_terminal() {
            counter!("moderation_conflicts_total").increment(1);
            return Err(ModerationError::InvalidTransition {
                id,
                status: entry.status(),
            });
        }
        entry.record.set_status(target);
        entry.decided_at = Some(now);
        entry.decided_by = Some(actor.to_string());

        counter!("moderation_transitions_total", "status" => target.as_str()).increment(1);
        info!(target: "moderation", id, status = target.as_str(), "entry decided");
        Ok(entry.clone())
    }

    pub fn get(&self, id: EntryId) -> Option<ModerationEntry> {
        self.lock().entries.get(&id).cloned()
    }

    /// Entries matching `filter` (all when `None`), in insertion order.
    pub fn list(&self, filter: Option<Status>) -> Vec<ModerationEntry> {
        self.lock()
            .entries
            .values()
            .filter(|e| filter.map_or(true, |s| e.status() == s))
            .cloned()
            .collect()
    }

    /// Drop decided entries older than the retention window. Returns how many went.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.lock();
        self.purge_locked(&mut inner, now)
    }

    fn purge_locked(&self, inner: &mut Inner, now: DateTime<Utc>) -> usize {
        // A window reaching past the representable range keeps everything.
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.expired(cutoff));
        let purged = before - inner.entries.len();
        if purged > 0 {
            debug!(target: "moderation", purged, "retention purge");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts over the entries on file; "today" is the UTC day of `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> StoreStats {
        let inner = self.lock();
        let today = now.date_naive();
        let decided_today = |e: &ModerationEntry, s: Status| {
            e.status() == s && e.decided_at.is_some_and(|t| t.date_naive() == today)
        };
        let mut st = StoreStats {
            total_parsed: inner.next_id - 1,
            ..StoreStats::default()
        };
        for e in inner.entries.values() {
            match e.status() {
                Status::Pending => st.pending_count += 1,
                Status::Published => st.published_count += 1,
                Status::Rejected => st.rejected_count += 1,
            }
            if e.created_at.date_naive() == today {
                st.parsed_today += 1;
            }
            if decided_today(e, Status::Published) {
                st.published_today += 1;
            }
            if decided_today(e, Status::Rejected) {
                st.rejected_today += 1;
            }
        }
        st
    }
}
