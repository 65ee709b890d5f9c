//! Repository for the `queue_entries` table.

use qdesk_core::types::{DbId, Timestamp};
use sqlx::{Sqlite, SqliteConnection};

use crate::models::queue_entry::{EntryTransition, QueueEntry, QueueListQuery};
use crate::models::service_type::ServiceType;
use crate::models::status::QueueStatus;
use crate::DbPool;

/// Select list joining the service type name.
const SELECT: &str = "\
    SELECT q.id, q.service_type_id, s.name AS service_type_name, q.queue_number, \
           q.sequence, q.period_key, q.status, q.counter, \
           q.created_at, q.called_at, q.updated_at \
    FROM queue_entries q \
    JOIN service_types s ON s.id = q.service_type_id";

/// Provides ticket issuance and queue transitions.
pub struct QueueEntryRepo;

impl QueueEntryRepo {
    /// Issue the next ticket for `service_type` within `period_key`.
    ///
    /// The sequence is `MAX(sequence) + 1` for the period (never below
    /// `start_number`), computed inside the insert so concurrent issuers
    /// cannot take the same number. The number is rendered as the prefix
    /// followed by a zero-padded three-digit sequence (`A001`).
    pub async fn issue(
        conn: &mut SqliteConnection,
        service_type: &ServiceType,
        period_key: &str,
        start_number: i64,
        now: Timestamp,
    ) -> Result<QueueEntry, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO queue_entries \
                 (service_type_id, queue_number, sequence, period_key, status, created_at, updated_at) \
             SELECT ?1, ?2 || printf('%03d', next_seq), next_seq, ?3, ?4, ?5, ?5 \
             FROM ( \
                 SELECT max(COALESCE(MAX(sequence), 0) + 1, ?6) AS next_seq \
                 FROM queue_entries \
                 WHERE service_type_id = ?1 AND period_key = ?3 \
             ) \
             RETURNING id",
        )
        .bind(service_type.id)
        .bind(&service_type.prefix)
        .bind(period_key)
        .bind(QueueStatus::Waiting.as_str())
        .bind(now)
        .bind(start_number)
        .fetch_one(&mut *conn)
        .await?;

        Self::find_by_id(&mut *conn, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<QueueEntry>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!("{SELECT} WHERE q.id = ?1");
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Move the oldest waiting entry (optionally of one service type) to
    /// `called` at `counter`. Returns `None` when nobody is waiting.
    pub async fn call_next(
        pool: &DbPool,
        counter: &str,
        service_type_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<Option<QueueEntry>, sqlx::Error> {
        let called: Option<(DbId,)> = sqlx::query_as(
            "UPDATE queue_entries \
             SET status = ?1, counter = ?2, called_at = ?3, updated_at = ?3 \
             WHERE id = ( \
                 SELECT id FROM queue_entries \
                 WHERE status = ?4 AND (?5 IS NULL OR service_type_id = ?5) \
                 ORDER BY id \
                 LIMIT 1 \
             ) AND status = ?4 \
             RETURNING id",
        )
        .bind(QueueStatus::Called.as_str())
        .bind(counter)
        .bind(now)
        .bind(QueueStatus::Waiting.as_str())
        .bind(service_type_id)
        .fetch_optional(pool)
        .await?;

        match called {
            Some((id,)) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Close an open (`waiting` or `called`) entry as `served` or
    /// `cancelled`.
    pub async fn close(
        pool: &DbPool,
        id: DbId,
        target: QueueStatus,
        now: Timestamp,
    ) -> Result<EntryTransition, sqlx::Error> {
        let closed: Option<(DbId,)> = sqlx::query_as(
            "UPDATE queue_entries SET status = ?2, updated_at = ?3 \
             WHERE id = ?1 AND status IN (?4, ?5) \
             RETURNING id",
        )
        .bind(id)
        .bind(target.as_str())
        .bind(now)
        .bind(QueueStatus::Waiting.as_str())
        .bind(QueueStatus::Called.as_str())
        .fetch_optional(pool)
        .await?;

        let entry = Self::find_by_id(pool, id).await?;
        Ok(match (closed, entry) {
            (Some(_), Some(entry)) => EntryTransition::Applied(entry),
            (None, Some(entry)) => EntryTransition::AlreadyClosed(entry),
            (_, None) => EntryTransition::NotFound,
        })
    }

    /// Number of entries currently waiting.
    pub async fn waiting_count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue_entries WHERE status = ?1")
            .bind(QueueStatus::Waiting.as_str())
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Most recently called entries, newest first.
    pub async fn recent_called(pool: &DbPool, limit: i64) -> Result<Vec<QueueEntry>, sqlx::Error> {
        let query = format!(
            "{SELECT} WHERE q.called_at IS NOT NULL \
             ORDER BY q.called_at DESC, q.id DESC \
             LIMIT ?1"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List entries, newest first, with an optional status filter.
    pub async fn list(pool: &DbPool, params: &QueueListQuery) -> Result<Vec<QueueEntry>, sqlx::Error> {
        let (limit, offset) = super::page(params.limit, params.offset);
        let query = format!(
            "{SELECT} WHERE (?1 IS NULL OR q.status = ?1) \
             ORDER BY q.id DESC \
             LIMIT ?2 OFFSET ?3"
        );
        sqlx::query_as::<_, QueueEntry>(&query)
            .bind(params.status.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Cancel every open entry created before `cutoff`. Returns the number
    /// of entries cancelled.
    pub async fn cancel_stale(
        pool: &DbPool,
        cutoff: Timestamp,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE queue_entries SET status = ?1, updated_at = ?2 \
             WHERE status IN (?3, ?4) AND created_at < ?5",
        )
        .bind(QueueStatus::Cancelled.as_str())
        .bind(now)
        .bind(QueueStatus::Waiting.as_str())
        .bind(QueueStatus::Called.as_str())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
