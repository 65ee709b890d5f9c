//! Ticket issuance: the queue entry and its print job are committed
//! together, and only then announced.

use chrono::Utc;
use qdesk_core::error::CoreError;
use qdesk_core::queue_number::period_key;
use qdesk_core::ticket::{format_ticket_datetime, TicketTemplate};
use qdesk_core::types::DbId;
use qdesk_db::models::print_job::{NewPrintJob, PrintJob};
use qdesk_db::models::queue_entry::QueueEntry;
use qdesk_db::models::setting::SETTING_TICKET_TEMPLATE;
use qdesk_db::models::status::PrintJobStatus;
use qdesk_db::repositories::{PrintJobRepo, QueueEntryRepo, ServiceTypeRepo, SettingRepo};
use serde::Serialize;

use crate::engine::publisher;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Result of issuing a ticket.
#[derive(Debug, Serialize)]
pub struct IssuedTicket {
    pub entry: QueueEntry,
    /// Absent when remote printing is disabled.
    pub print_job: Option<PrintJob>,
}

/// The template a new print job will carry.
struct ResolvedTemplate {
    raw: String,
    /// Parse error when the stored template is malformed.
    rejected: Option<String>,
}

/// Read the stored ticket template, falling back to the default.
///
/// The stored text is kept verbatim so the agent sees exactly what the
/// operator saved.
async fn resolve_template(state: &AppState) -> AppResult<ResolvedTemplate> {
    match SettingRepo::get(&state.pool, SETTING_TICKET_TEMPLATE).await? {
        Some(raw) => {
            let rejected = TicketTemplate::parse(&raw).err().map(|e| e.to_string());
            Ok(ResolvedTemplate { raw, rejected })
        }
        None => Ok(ResolvedTemplate {
            raw: TicketTemplate::default().to_json()?,
            rejected: None,
        }),
    }
}

/// Issue the next ticket for `service_type_id`.
///
/// The entry and (if remote printing is enabled) its print job are written
/// in one transaction. Events go out after the commit: `queue_added` to
/// displays and counters, then `print_job` to agents for a pending job or
/// `print_job_updated` to counters for a job rejected on creation.
pub async fn issue_ticket(state: &AppState, service_type_id: DbId) -> AppResult<IssuedTicket> {
    let service_type = ServiceTypeRepo::find_by_id(&state.pool, service_type_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ServiceType",
            id: service_type_id,
        }))?;

    if !service_type.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "service type '{}' is not active",
            service_type.name
        ))));
    }

    // Read before the transaction starts; it must not wait on a second
    // pool connection while holding the write lock.
    let template = if state.config.remote_print_enabled {
        Some(resolve_template(state).await?)
    } else {
        None
    };

    let now = Utc::now();
    let period = period_key(now, state.config.queue_reset_daily);

    let mut tx = state.pool.begin().await?;

    let entry = QueueEntryRepo::issue(
        &mut tx,
        &service_type,
        &period,
        state.config.queue_start_number,
        now,
    )
    .await?;

    let print_job = match template {
        Some(template) => {
            let input = NewPrintJob {
                queue_entry_id: Some(entry.id),
                queue_number: entry.queue_number.clone(),
                type_name: service_type.name.clone(),
                date_time: format_ticket_datetime(now),
                template_json: template.raw,
                rejected: template.rejected,
            };
            Some(PrintJobRepo::create(&mut tx, &input, now).await?)
        }
        None => None,
    };

    tx.commit().await?;

    tracing::info!(
        entry_id = entry.id,
        queue_number = %entry.queue_number,
        print_job_id = print_job.as_ref().map(|j| j.id),
        "Ticket issued",
    );

    if let Some(waiting) = publisher::current_waiting(&state.pool).await {
        publisher::queue_added(&state.hub, &entry, waiting);
    }

    if let Some(job) = &print_job {
        match job.status() {
            Some(PrintJobStatus::Pending) => publisher::print_job_ready(&state.hub, job),
            _ => {
                tracing::warn!(
                    job_id = job.id,
                    error = job.error_message.as_deref().unwrap_or(""),
                    "Print job rejected on creation",
                );
                publisher::print_job_updated(&state.hub, job);
            }
        }
    }

    Ok(IssuedTicket { entry, print_job })
}
