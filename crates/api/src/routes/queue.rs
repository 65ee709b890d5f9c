//! Route definitions for the `/queue` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::queue;
use crate::state::AppState;

/// Routes mounted at `/queue`.
///
/// ```text
/// GET    /                -> list
/// POST   /tickets         -> issue_ticket
/// POST   /call-next       -> call_next
/// POST   /{id}/recall     -> recall
/// POST   /{id}/serve      -> serve
/// POST   /{id}/cancel     -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(queue::list))
        .route("/tickets", post(queue::issue_ticket))
        .route("/call-next", post(queue::call_next))
        .route("/{id}/recall", post(queue::recall))
        .route("/{id}/serve", post(queue::serve))
        .route("/{id}/cancel", post(queue::cancel))
}
