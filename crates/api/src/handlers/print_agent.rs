//! Handlers for the print-agent dispatch protocol.
//!
//! Agents catch up with `GET /jobs/pending`, listen on `GET /sse`, and move
//! a job through `claim`, then `complete` or `fail`. Every mutating call is
//! safe to repeat: a second claim is a 409 the agent skips, and a repeated
//! complete/fail on a finished job returns the stored record unchanged.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use qdesk_core::dispatch::{ClaimRequest, CompleteRequest, FailRequest, PrintJobRecord};
use qdesk_core::error::CoreError;
use qdesk_core::types::DbId;
use qdesk_db::models::print_job::{ClaimOutcome, PrintJob, TransitionOutcome};
use qdesk_db::repositories::PrintJobRepo;
use qdesk_events::Audience;
use serde::Deserialize;

use crate::engine::publisher;
use crate::error::{AppError, AppResult};
use crate::sse;
use crate::state::AppState;

/// Query parameters for `GET /print-agent/sse`.
#[derive(Debug, Deserialize)]
pub struct AgentStreamQuery {
    pub agent_id: Option<String>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "PrintJob",
        id,
    })
}

/// Map a complete/fail outcome to the response, publishing on change.
fn settle(state: &AppState, id: DbId, action: &str, outcome: TransitionOutcome) -> AppResult<Json<PrintJobRecord>> {
    match outcome {
        TransitionOutcome::Applied(job) => {
            tracing::info!(
                job_id = job.id,
                agent_id = job.agent_id.as_deref().unwrap_or("-"),
                status = %job.status,
                "Print job {action}",
            );
            publisher::print_job_updated(&state.hub, &job);
            Ok(Json(job.to_record()))
        }
        TransitionOutcome::AlreadyTerminal(job) => {
            tracing::debug!(job_id = job.id, status = %job.status, "Repeated {action} ignored");
            Ok(Json(job.to_record()))
        }
        TransitionOutcome::NotClaimant(job) => Err(AppError::Core(CoreError::Conflict(format!(
            "print job {} is claimed by another agent",
            job.id
        )))),
        TransitionOutcome::InvalidState(job) => Err(AppError::Core(CoreError::Conflict(format!(
            "print job {} is {} and cannot be {action}",
            job.id, job.status
        )))),
        TransitionOutcome::NotFound => Err(not_found(id)),
    }
}

/// Parse an optional JSON body; an empty body yields the default.
fn optional_body<T: Default + serde::de::DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// GET /api/v1/print-agent/jobs/pending
///
/// All pending jobs in creation order. Any agent may claim any of them.
pub async fn list_pending(State(state): State<AppState>) -> AppResult<Json<Vec<PrintJobRecord>>> {
    let jobs = PrintJobRepo::list_pending(&state.pool).await?;
    Ok(Json(jobs.iter().map(PrintJob::to_record).collect()))
}

/// GET /api/v1/print-agent/sse?agent_id=
///
/// Live `print_job` notifications. Nothing is replayed; agents catch up
/// with the pending list after every connect.
pub async fn stream(
    State(state): State<AppState>,
    Query(params): Query<AgentStreamQuery>,
) -> impl IntoResponse {
    let agent_id = params.agent_id.filter(|id| !id.trim().is_empty());
    tracing::info!(agent_id = agent_id.as_deref().unwrap_or("-"), "Print agent connected");

    let subscription = state.hub.register(Audience::PrintAgent, agent_id);
    sse::event_stream(subscription, state.config.sse_heartbeat())
}

/// POST /api/v1/print-agent/job/{id}/claim
///
/// Atomically moves a pending job to `claimed`. Returns the full record so
/// the agent can print without another read; 409 if someone else got it
/// first or it is already finished.
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ClaimRequest>,
) -> AppResult<Json<PrintJobRecord>> {
    let agent_id = input.agent_id.trim();
    if agent_id.is_empty() {
        return Err(AppError::BadRequest("agent_id is required".into()));
    }

    match PrintJobRepo::claim(&state.pool, id, agent_id, Utc::now()).await? {
        ClaimOutcome::Claimed(job) => {
            tracing::info!(job_id = job.id, agent_id, queue_number = %job.queue_number, "Print job claimed");
            publisher::print_job_updated(&state.hub, &job);
            Ok(Json(job.to_record()))
        }
        ClaimOutcome::Conflict(job) => {
            tracing::debug!(job_id = job.id, agent_id, status = %job.status, "Claim conflict");
            Err(AppError::Core(CoreError::Conflict(format!(
                "print job {} is already {}",
                job.id, job.status
            ))))
        }
        ClaimOutcome::NotFound => Err(not_found(id)),
    }
}

/// POST /api/v1/print-agent/job/{id}/complete
///
/// Body is optional; `{"agent_id": ...}` restricts the transition to the
/// claimant.
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Bytes,
) -> AppResult<Json<PrintJobRecord>> {
    let input: CompleteRequest = optional_body(&body)?;
    let outcome = PrintJobRepo::complete(&state.pool, id, input.agent_id.as_deref(), Utc::now()).await?;
    settle(&state, id, "completed", outcome)
}

/// POST /api/v1/print-agent/job/{id}/fail
///
/// Records the failure reason. The job stays failed until an operator
/// requeues it.
pub async fn fail(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<FailRequest>,
) -> AppResult<Json<PrintJobRecord>> {
    let reason = match input.error.trim() {
        "" => "unspecified print failure",
        reason => reason,
    };
    let outcome =
        PrintJobRepo::fail(&state.pool, id, input.agent_id.as_deref(), reason, Utc::now()).await?;
    settle(&state, id, "failed", outcome)
}
