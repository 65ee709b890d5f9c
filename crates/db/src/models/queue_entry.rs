//! Queue entries (tickets) and their DTOs.

use qdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::QueueStatus;

/// A row from `queue_entries`, joined with its service type name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueueEntry {
    pub id: DbId,
    pub service_type_id: DbId,
    pub service_type_name: String,
    pub queue_number: String,
    pub sequence: i64,
    pub period_key: String,
    pub status: String,
    pub counter: Option<String>,
    pub created_at: Timestamp,
    pub called_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl QueueEntry {
    pub fn status(&self) -> Option<QueueStatus> {
        QueueStatus::parse(&self.status)
    }
}

/// DTO for `POST /api/v1/queue/tickets`.
#[derive(Debug, Deserialize)]
pub struct IssueTicket {
    pub service_type_id: DbId,
}

/// DTO for `POST /api/v1/queue/call-next`.
#[derive(Debug, Deserialize)]
pub struct CallNext {
    pub counter: String,
    pub service_type_id: Option<DbId>,
}

/// Query parameters for `GET /api/v1/queue`.
#[derive(Debug, Default, Deserialize)]
pub struct QueueListQuery {
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of a guarded queue entry transition (serve, cancel).
#[derive(Debug)]
pub enum EntryTransition {
    Applied(QueueEntry),
    /// The entry exists but is already `served` or `cancelled`.
    AlreadyClosed(QueueEntry),
    NotFound,
}
