//! PostgreSQL session store.
//!
//! Multi-statement writes run in one transaction holding a per-user advisory
//! lock, so issuance, rotation and revocation of one user never interleave.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgConnection, PgExecutor, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{SessionRecord, SessionStore, StoreError};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const RECORD_COLUMNS: &str =
    "id, user_id, refresh_proof_hash, client_agent, client_ip, revoked, issued_at";

#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `session_records` table and its indexes if missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        let span = info_span!("db.query", db.system = "postgresql", db.operation = "DDL");
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn fetch_one_record(
        &self,
        query: &str,
        operation: &'static str,
        user_id: Uuid,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = operation,
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }
}

fn record_from_row(row: &PgRow) -> Result<SessionRecord, StoreError> {
    Ok(SessionRecord {
        record_id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        refresh_proof_hash: row.try_get("refresh_proof_hash")?,
        client_agent: row.try_get("client_agent")?,
        client_ip: row.try_get("client_ip")?,
        revoked: row.try_get("revoked")?,
        issued_at: row.try_get("issued_at")?,
    })
}

/// Serialize writers of one user's records until the transaction ends.
async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> Result<(), StoreError> {
    let query = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "LOCK",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id.to_string())
        .execute(conn)
        .instrument(span)
        .await?;
    Ok(())
}

async fn insert_record<'e, E>(
    executor: E,
    record: &SessionRecord,
) -> Result<SessionRecord, StoreError>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        r"
        INSERT INTO session_records
            (id, user_id, refresh_proof_hash, client_agent, client_ip, revoked, issued_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {RECORD_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(record.record_id)
        .bind(record.user_id)
        .bind(&record.refresh_proof_hash)
        .bind(&record.client_agent)
        .bind(&record.client_ip)
        .bind(record.revoked)
        .bind(record.issued_at)
        .fetch_one(executor)
        .instrument(span)
        .await?;
    record_from_row(&row)
}

async fn revoke_live<'e, E>(executor: E, user_id: Uuid) -> Result<u64, StoreError>
where
    E: PgExecutor<'e>,
{
    let query = "UPDATE session_records SET revoked = TRUE WHERE user_id = $1 AND NOT revoked";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(executor)
        .instrument(span)
        .await?;
    Ok(result.rows_affected())
}

async fn revoke_one<'e, E>(
    executor: E,
    user_id: Uuid,
    record_id: Uuid,
) -> Result<u64, StoreError>
where
    E: PgExecutor<'e>,
{
    // Conditional update: only one concurrent caller can flip the flag.
    let query = r"
        UPDATE session_records
        SET revoked = TRUE
        WHERE id = $1 AND user_id = $2 AND NOT revoked
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(record_id)
        .bind(user_id)
        .execute(executor)
        .instrument(span)
        .await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord, StoreError> {
        insert_record(&self.pool, &record).await
    }

    async fn find_active(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let query = format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM session_records
            WHERE user_id = $1 AND NOT revoked
            ORDER BY issued_at DESC, id DESC
            LIMIT 1
            "
        );
        self.fetch_one_record(&query, "SELECT", user_id).await
    }

    async fn find_latest(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let query = format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM session_records
            WHERE user_id = $1
            ORDER BY issued_at DESC, id DESC
            LIMIT 1
            "
        );
        self.fetch_one_record(&query, "SELECT", user_id).await
    }

    async fn revoke_active(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        let revoked = revoke_live(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(revoked)
    }

    async fn insert_exclusive(&self, record: SessionRecord) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, record.user_id).await?;
        let revoked = revoke_live(&mut *tx, record.user_id).await?;
        insert_record(&mut *tx, &record).await?;
        tx.commit().await?;
        Ok(revoked)
    }

    async fn replace_session(
        &self,
        previous: Uuid,
        record: SessionRecord,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, record.user_id).await?;
        if revoke_one(&mut *tx, record.user_id, previous).await? == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        insert_record(&mut *tx, &record).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }
}
