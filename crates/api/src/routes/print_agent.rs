//! Route definitions for the print-agent dispatch protocol.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::print_agent;
use crate::state::AppState;

/// Routes mounted at `/print-agent`.
///
/// ```text
/// GET    /jobs/pending        -> list_pending
/// POST   /job/{id}/claim      -> claim
/// POST   /job/{id}/complete   -> complete
/// POST   /job/{id}/fail       -> fail
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs/pending", get(print_agent::list_pending))
        .route("/job/{id}/claim", post(print_agent::claim))
        .route("/job/{id}/complete", post(print_agent::complete))
        .route("/job/{id}/fail", post(print_agent::fail))
}

/// The agent event stream, kept outside the request timeout.
pub fn stream_router() -> Router<AppState> {
    Router::new().route("/print-agent/sse", get(print_agent::stream))
}
