use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when SQLite does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Displays, counters and print agents currently streaming.
    pub subscribers: usize,
}

/// GET /health
///
/// Always 200 so load balancers can tell a slow database from a dead
/// process; the body says which.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = qdesk_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        subscribers: state.hub.total_subscribers(),
    })
}

/// Mounted at the root, outside `/api/v1` and its request timeout.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
