//! In-process session store.
//!
//! Used for local development when no DSN is configured, and by tests. All
//! operations take one mutex, so each revoke is trivially a compare-and-set
//! and revoke-then-insert never interleaves with another write.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{SessionRecord, SessionStore, StoreError};

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<Uuid, Vec<SessionRecord>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full issuance history of a user, oldest first.
    pub async fn history(&self, user_id: Uuid) -> Vec<SessionRecord> {
        self.records
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn push_sorted(history: &mut Vec<SessionRecord>, record: SessionRecord) {
    history.push(record);
    // Keep issuance order even if a caller inserts a backdated record.
    history.sort_by_key(|stored| (stored.issued_at, stored.record_id));
}

fn revoke_live(history: &mut [SessionRecord]) -> u64 {
    let mut affected = 0;
    for record in history.iter_mut().filter(|record| !record.revoked) {
        record.revoked = true;
        affected += 1;
    }
    affected
}

fn revoke_one(history: &mut [SessionRecord], record_id: Uuid) -> u64 {
    history
        .iter_mut()
        .find(|record| record.record_id == record_id && !record.revoked)
        .map_or(0, |record| {
            record.revoked = true;
            1
        })
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord, StoreError> {
        let mut records = self.records.lock().await;
        push_sorted(records.entry(record.user_id).or_default(), record.clone());
        Ok(record)
    }

    async fn find_active(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&user_id)
            .and_then(|history| history.iter().rev().find(|record| !record.revoked))
            .cloned())
    }

    async fn find_latest(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&user_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn revoke_active(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut records = self.records.lock().await;
        Ok(records
            .get_mut(&user_id)
            .map_or(0, |history| revoke_live(history)))
    }

    async fn insert_exclusive(&self, record: SessionRecord) -> Result<u64, StoreError> {
        let mut records = self.records.lock().await;
        let history = records.entry(record.user_id).or_default();
        let revoked = revoke_live(history);
        push_sorted(history, record);
        Ok(revoked)
    }

    async fn replace_session(
        &self,
        previous: Uuid,
        record: SessionRecord,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        let Some(history) = records.get_mut(&record.user_id) else {
            return Ok(false);
        };
        if revoke_one(history, previous) == 0 {
            return Ok(false);
        }
        push_sorted(history, record);
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
