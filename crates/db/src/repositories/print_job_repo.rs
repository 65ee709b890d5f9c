//! Repository for the `print_jobs` table.
//!
//! Every transition is a conditional `UPDATE ... WHERE status = ...
//! RETURNING`, so of several concurrent callers exactly one observes the
//! row it changed. A caller that changed nothing re-reads the row to learn
//! why (not found, already terminal, someone else's claim).

use qdesk_core::types::{DbId, Timestamp};
use sqlx::SqliteConnection;

use crate::models::print_job::{
    ClaimOutcome, NewPrintJob, PrintJob, PrintJobListQuery, TransitionOutcome,
};
use crate::models::status::PrintJobStatus;
use crate::DbPool;

/// Column list for `print_jobs` queries.
const COLUMNS: &str = "\
    id, queue_entry_id, queue_number, type_name, date_time, template_json, \
    status, agent_id, error_message, claimed_at, finished_at, created_at, updated_at";

/// Provides the dispatch-protocol state machine over print jobs.
pub struct PrintJobRepo;

impl PrintJobRepo {
    /// Insert a new job, `pending` unless `input.rejected` carries a
    /// validation failure, in which case it starts out `failed`.
    pub async fn create(
        conn: &mut SqliteConnection,
        input: &NewPrintJob,
        now: Timestamp,
    ) -> Result<PrintJob, sqlx::Error> {
        let status = if input.rejected.is_some() {
            PrintJobStatus::Failed
        } else {
            PrintJobStatus::Pending
        };
        let finished_at = input.rejected.as_ref().map(|_| now);

        let query = format!(
            "INSERT INTO print_jobs \
                 (queue_entry_id, queue_number, type_name, date_time, template_json, \
                  status, error_message, finished_at, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PrintJob>(&query)
            .bind(input.queue_entry_id)
            .bind(&input.queue_number)
            .bind(&input.type_name)
            .bind(&input.date_time)
            .bind(&input.template_json)
            .bind(status.as_str())
            .bind(input.rejected.as_deref())
            .bind(finished_at)
            .bind(now)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<PrintJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM print_jobs WHERE id = ?1");
        sqlx::query_as::<_, PrintJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All pending jobs in creation order, for agent catch-up.
    pub async fn list_pending(pool: &DbPool) -> Result<Vec<PrintJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM print_jobs WHERE status = ?1 ORDER BY id ASC");
        sqlx::query_as::<_, PrintJob>(&query)
            .bind(PrintJobStatus::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    /// List jobs, newest first, with an optional status filter.
    pub async fn list(pool: &DbPool, params: &PrintJobListQuery) -> Result<Vec<PrintJob>, sqlx::Error> {
        let (limit, offset) = super::page(params.limit, params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM print_jobs \
             WHERE (?1 IS NULL OR status = ?1) \
             ORDER BY id DESC \
             LIMIT ?2 OFFSET ?3"
        );
        sqlx::query_as::<_, PrintJob>(&query)
            .bind(params.status.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Atomically move a `pending` job to `claimed` by `agent_id`.
    pub async fn claim(
        pool: &DbPool,
        id: DbId,
        agent_id: &str,
        now: Timestamp,
    ) -> Result<ClaimOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE print_jobs \
             SET status = ?2, agent_id = ?3, claimed_at = ?4, updated_at = ?4 \
             WHERE id = ?1 AND status = ?5 \
             RETURNING {COLUMNS}"
        );
        let claimed = sqlx::query_as::<_, PrintJob>(&query)
            .bind(id)
            .bind(PrintJobStatus::Claimed.as_str())
            .bind(agent_id)
            .bind(now)
            .bind(PrintJobStatus::Pending.as_str())
            .fetch_optional(pool)
            .await?;

        if let Some(job) = claimed {
            return Ok(ClaimOutcome::Claimed(job));
        }

        Ok(match Self::find_by_id(pool, id).await? {
            Some(job) => ClaimOutcome::Conflict(job),
            None => ClaimOutcome::NotFound,
        })
    }

    /// Move a `claimed` job to `completed`.
    ///
    /// When `agent_id` is given it must match the claimant.
    pub async fn complete(
        pool: &DbPool,
        id: DbId,
        agent_id: Option<&str>,
        now: Timestamp,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE print_jobs \
             SET status = ?2, finished_at = ?3, updated_at = ?3 \
             WHERE id = ?1 AND status = ?4 AND (?5 IS NULL OR agent_id = ?5) \
             RETURNING {COLUMNS}"
        );
        let done = sqlx::query_as::<_, PrintJob>(&query)
            .bind(id)
            .bind(PrintJobStatus::Completed.as_str())
            .bind(now)
            .bind(PrintJobStatus::Claimed.as_str())
            .bind(agent_id)
            .fetch_optional(pool)
            .await?;

        Self::settle(pool, id, done).await
    }

    /// Move a `claimed` job to `failed` with a human-readable reason.
    ///
    /// When `agent_id` is given it must match the claimant. No automatic
    /// retry follows; see [`requeue`](Self::requeue).
    pub async fn fail(
        pool: &DbPool,
        id: DbId,
        agent_id: Option<&str>,
        error: &str,
        now: Timestamp,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE print_jobs \
             SET status = ?2, error_message = ?3, finished_at = ?4, updated_at = ?4 \
             WHERE id = ?1 AND status = ?5 AND (?6 IS NULL OR agent_id = ?6) \
             RETURNING {COLUMNS}"
        );
        let failed = sqlx::query_as::<_, PrintJob>(&query)
            .bind(id)
            .bind(PrintJobStatus::Failed.as_str())
            .bind(error)
            .bind(now)
            .bind(PrintJobStatus::Claimed.as_str())
            .bind(agent_id)
            .fetch_optional(pool)
            .await?;

        Self::settle(pool, id, failed).await
    }

    /// Put a `failed` or stuck `claimed` job back to `pending`, clearing
    /// the claimant and error. This is the only way a job is printed again.
    pub async fn requeue(
        pool: &DbPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE print_jobs \
             SET status = ?2, agent_id = NULL, error_message = NULL, \
                 claimed_at = NULL, finished_at = NULL, updated_at = ?3 \
             WHERE id = ?1 AND status IN (?4, ?5) \
             RETURNING {COLUMNS}"
        );
        let requeued = sqlx::query_as::<_, PrintJob>(&query)
            .bind(id)
            .bind(PrintJobStatus::Pending.as_str())
            .bind(now)
            .bind(PrintJobStatus::Failed.as_str())
            .bind(PrintJobStatus::Claimed.as_str())
            .fetch_optional(pool)
            .await?;

        if let Some(job) = requeued {
            return Ok(TransitionOutcome::Applied(job));
        }
        Ok(match Self::find_by_id(pool, id).await? {
            Some(job) => TransitionOutcome::InvalidState(job),
            None => TransitionOutcome::NotFound,
        })
    }

    /// Delete `completed`/`failed` jobs last touched before `cutoff`.
    pub async fn delete_terminal_older_than(
        pool: &DbPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM print_jobs WHERE status IN (?1, ?2) AND updated_at < ?3",
        )
        .bind(PrintJobStatus::Completed.as_str())
        .bind(PrintJobStatus::Failed.as_str())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Classify an agent-reported transition after its conditional update.
    async fn settle(
        pool: &DbPool,
        id: DbId,
        updated: Option<PrintJob>,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        if let Some(job) = updated {
            return Ok(TransitionOutcome::Applied(job));
        }

        let Some(job) = Self::find_by_id(pool, id).await? else {
            return Ok(TransitionOutcome::NotFound);
        };

        Ok(match job.status() {
            Some(status) if status.is_terminal() => TransitionOutcome::AlreadyTerminal(job),
            Some(PrintJobStatus::Claimed) => TransitionOutcome::NotClaimant(job),
            _ => TransitionOutcome::InvalidState(job),
        })
    }
}
