//! Admin view of print jobs, including the manual requeue.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use qdesk_core::error::CoreError;
use qdesk_core::types::DbId;
use qdesk_db::models::print_job::{PrintJob, PrintJobListQuery, TransitionOutcome};
use qdesk_db::models::status::PrintJobStatus;
use qdesk_db::repositories::PrintJobRepo;

use crate::engine::publisher;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn job_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "PrintJob",
        id,
    })
}

/// GET /api/v1/print-jobs?status=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PrintJobListQuery>,
) -> AppResult<Json<DataResponse<Vec<PrintJob>>>> {
    if let Some(status) = params.status.as_deref() {
        if PrintJobStatus::parse(status).is_none() {
            return Err(AppError::BadRequest(format!("unknown print job status '{status}'")));
        }
    }

    let data = PrintJobRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/print-jobs/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintJob>>> {
    let job = PrintJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(DataResponse { data: job }))
}

/// POST /api/v1/print-jobs/{id}/requeue
///
/// Release a failed or stuck claimed job back to `pending` and notify
/// agents. 409 for pending or completed jobs.
pub async fn requeue(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PrintJob>>> {
    match PrintJobRepo::requeue(&state.pool, id, Utc::now()).await? {
        TransitionOutcome::Applied(job) => {
            tracing::info!(job_id = job.id, queue_number = %job.queue_number, "Print job requeued");
            publisher::print_job_updated(&state.hub, &job);
            publisher::print_job_ready(&state.hub, &job);
            Ok(Json(DataResponse { data: job }))
        }
        TransitionOutcome::NotFound => Err(job_not_found(id)),
        TransitionOutcome::InvalidState(job)
        | TransitionOutcome::AlreadyTerminal(job)
        | TransitionOutcome::NotClaimant(job) => Err(AppError::Core(CoreError::Conflict(format!(
            "print job {} is {} and cannot be requeued",
            job.id, job.status
        )))),
    }
}
