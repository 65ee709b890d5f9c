//! Display and counter streams, plus the polling fallback for displays.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use qdesk_db::models::queue_entry::QueueEntry;
use qdesk_db::repositories::QueueEntryRepo;
use qdesk_events::Audience;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::sse;
use crate::state::AppState;

/// How many recently called tickets the display shows.
const RECENT_CALLED_LIMIT: i64 = 5;

/// Point-in-time snapshot of what a display shows.
#[derive(Debug, Serialize)]
pub struct DisplayState {
    pub waiting_count: i64,
    pub last_called: Option<QueueEntry>,
    pub recent_called: Vec<QueueEntry>,
}

/// GET /api/v1/sse/display
pub async fn display_stream(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.hub.register(Audience::Display, None);
    sse::event_stream(subscription, state.config.sse_heartbeat())
}

/// GET /api/v1/sse/counter
pub async fn counter_stream(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.hub.register(Audience::Counter, None);
    sse::event_stream(subscription, state.config.sse_heartbeat())
}

/// GET /api/v1/display/state
///
/// Polled by displays whose stream has gone quiet, so it reflects events
/// they may have missed.
pub async fn display_state(State(state): State<AppState>) -> AppResult<Json<DataResponse<DisplayState>>> {
    let waiting_count = QueueEntryRepo::waiting_count(&state.pool).await?;
    let recent_called = QueueEntryRepo::recent_called(&state.pool, RECENT_CALLED_LIMIT).await?;

    Ok(Json(DataResponse {
        data: DisplayState {
            waiting_count,
            last_called: recent_called.first().cloned(),
            recent_called,
        },
    }))
}
