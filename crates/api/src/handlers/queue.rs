//! Handlers for the `/queue` resource: issuing, calling and closing
//! tickets.
//!
//! Each handler commits its change first and publishes afterwards.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use qdesk_core::error::CoreError;
use qdesk_core::types::DbId;
use qdesk_db::models::queue_entry::{CallNext, EntryTransition, IssueTicket, QueueEntry, QueueListQuery};
use qdesk_db::models::status::QueueStatus;
use qdesk_db::repositories::QueueEntryRepo;

use crate::engine::{publisher, ticketing};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn entry_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "QueueEntry",
        id,
    })
}

/// Serve or cancel an open entry.
async fn close_entry(state: &AppState, id: DbId, target: QueueStatus) -> AppResult<Json<DataResponse<QueueEntry>>> {
    match QueueEntryRepo::close(&state.pool, id, target, Utc::now()).await? {
        EntryTransition::Applied(entry) => {
            tracing::info!(entry_id = entry.id, queue_number = %entry.queue_number, status = %entry.status, "Queue entry closed");
            if let Some(waiting) = publisher::current_waiting(&state.pool).await {
                publisher::queue_updated(&state.hub, Some(&entry), waiting);
            }
            Ok(Json(DataResponse { data: entry }))
        }
        EntryTransition::AlreadyClosed(entry) => Err(AppError::Core(CoreError::Conflict(format!(
            "queue entry {} is already {}",
            entry.id, entry.status
        )))),
        EntryTransition::NotFound => Err(entry_not_found(id)),
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// POST /api/v1/queue/tickets
///
/// Issue the next ticket. Returns 201 with the entry and its print job.
pub async fn issue_ticket(
    State(state): State<AppState>,
    Json(input): Json<IssueTicket>,
) -> AppResult<impl IntoResponse> {
    let issued = ticketing::issue_ticket(&state, input.service_type_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: issued })))
}

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// POST /api/v1/queue/call-next
///
/// Call the oldest waiting ticket to `counter`. 404 when nobody is
/// waiting.
pub async fn call_next(
    State(state): State<AppState>,
    Json(input): Json<CallNext>,
) -> AppResult<Json<DataResponse<QueueEntry>>> {
    let counter = input.counter.trim();
    if counter.is_empty() {
        return Err(AppError::BadRequest("counter is required".into()));
    }

    let entry = QueueEntryRepo::call_next(&state.pool, counter, input.service_type_id, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("no waiting tickets".into()))?;

    tracing::info!(entry_id = entry.id, queue_number = %entry.queue_number, counter, "Ticket called");

    if let Some(waiting) = publisher::current_waiting(&state.pool).await {
        publisher::queue_called(&state.hub, &entry, waiting);
        publisher::queue_updated(&state.hub, Some(&entry), waiting);
    }

    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/v1/queue/{id}/recall
///
/// Announce a called ticket again. State is unchanged.
pub async fn recall(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QueueEntry>>> {
    let entry = QueueEntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| entry_not_found(id))?;

    if entry.status() != Some(QueueStatus::Called) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "queue entry {} is {}, only called tickets can be recalled",
            entry.id, entry.status
        ))));
    }

    tracing::info!(entry_id = entry.id, queue_number = %entry.queue_number, "Ticket recalled");
    if let Some(waiting) = publisher::current_waiting(&state.pool).await {
        publisher::queue_called(&state.hub, &entry, waiting);
    }

    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// POST /api/v1/queue/{id}/serve
pub async fn serve(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QueueEntry>>> {
    close_entry(&state, id, QueueStatus::Served).await
}

/// POST /api/v1/queue/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QueueEntry>>> {
    close_entry(&state, id, QueueStatus::Cancelled).await
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/queue?status=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<QueueListQuery>,
) -> AppResult<Json<DataResponse<Vec<QueueEntry>>>> {
    if let Some(status) = params.status.as_deref() {
        if QueueStatus::parse(status).is_none() {
            return Err(AppError::BadRequest(format!("unknown queue status '{status}'")));
        }
    }

    let data = QueueEntryRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data }))
}
