//! Print jobs: one ticket to be printed by a remote print agent.

use qdesk_core::dispatch::{PrintJobRecord, PrintJobUpdate};
use qdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::PrintJobStatus;

/// A row from the `print_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrintJob {
    pub id: DbId,
    pub queue_entry_id: Option<DbId>,
    pub queue_number: String,
    pub type_name: String,
    pub date_time: String,
    pub template_json: String,
    pub status: String,
    pub agent_id: Option<String>,
    pub error_message: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PrintJob {
    pub fn status(&self) -> Option<PrintJobStatus> {
        PrintJobStatus::parse(&self.status)
    }

    /// The record shape served to print agents.
    pub fn to_record(&self) -> PrintJobRecord {
        PrintJobRecord {
            id: self.id,
            queue_number: self.queue_number.clone(),
            type_name: self.type_name.clone(),
            date_time: self.date_time.clone(),
            template_json: self.template_json.clone(),
            status: self.status.clone(),
            agent_id: self.agent_id.clone(),
            error_message: self.error_message.clone(),
        }
    }

    /// Payload for a `print_job_updated` event.
    pub fn to_update(&self) -> PrintJobUpdate {
        PrintJobUpdate {
            job_id: self.id,
            queue_number: self.queue_number.clone(),
            status: self.status.clone(),
            agent_id: self.agent_id.clone(),
            error: self.error_message.clone(),
        }
    }
}

/// Input for [`PrintJobRepo::create`](crate::repositories::PrintJobRepo::create).
#[derive(Debug, Clone)]
pub struct NewPrintJob {
    pub queue_entry_id: Option<DbId>,
    pub queue_number: String,
    pub type_name: String,
    pub date_time: String,
    pub template_json: String,
    /// When set, the job is created directly in `failed` with this reason.
    pub rejected: Option<String>,
}

/// Query parameters for `GET /api/v1/print-jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct PrintJobListQuery {
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of [`PrintJobRepo::claim`](crate::repositories::PrintJobRepo::claim).
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed(PrintJob),
    /// The job is no longer pending (claimed by someone, or terminal).
    Conflict(PrintJob),
    NotFound,
}

/// Result of an agent-reported transition (`complete`, `fail`) or an
/// admin requeue.
#[derive(Debug)]
pub enum TransitionOutcome {
    Applied(PrintJob),
    /// The job already reached `completed` or `failed`; nothing changed.
    AlreadyTerminal(PrintJob),
    /// The job is claimed, but by a different agent.
    NotClaimant(PrintJob),
    /// The job is in a state the transition does not start from.
    InvalidState(PrintJob),
    NotFound,
}
