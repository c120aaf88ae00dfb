//! Storage contract for session records.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::SessionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only history of refresh-credential records, one series per user.
///
/// Revocations must be conditional updates (`revoked = false -> true`) so the
/// affected-row count tells callers whether they won a race. Operations that
/// both revoke and insert must not interleave with other writes for the same
/// user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new record and return it as stored.
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord, StoreError>;

    /// Most recently issued non-revoked record for the user.
    async fn find_active(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError>;

    /// Most recently issued record for the user, revoked or not.
    async fn find_latest(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError>;

    /// Revoke every non-revoked record of the user; returns the affected count.
    async fn revoke_active(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Revoke every live record of `record.user_id` and persist `record` as one
    /// step per user. Returns the number of records revoked.
    async fn insert_exclusive(&self, record: SessionRecord) -> Result<u64, StoreError>;

    /// Revoke `previous` if it is still live and, only then, persist `record`,
    /// as one step per user. Returns `false` when `previous` was already
    /// revoked; nothing is written in that case.
    async fn replace_session(
        &self,
        previous: Uuid,
        record: SessionRecord,
    ) -> Result<bool, StoreError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
