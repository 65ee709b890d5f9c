//! Route definitions for print job administration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::print_jobs;
use crate::state::AppState;

/// Routes mounted at `/print-jobs`.
///
/// ```text
/// GET    /                -> list
/// GET    /{id}            -> get
/// POST   /{id}/requeue    -> requeue
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(print_jobs::list))
        .route("/{id}", get(print_jobs::get))
        .route("/{id}/requeue", post(print_jobs::requeue))
}
