use axum::routing::get;
use axum::Router;

use crate::handlers::display;
use crate::state::AppState;

/// Routes mounted at `/display`.
pub fn router() -> Router<AppState> {
    Router::new().route("/state", get(display::display_state))
}

/// Display and counter event streams, kept outside the request timeout.
///
/// ```text
/// GET    /sse/display    -> display_stream
/// GET    /sse/counter    -> counter_stream
/// ```
pub fn stream_router() -> Router<AppState> {
    Router::new()
        .route("/sse/display", get(display::display_stream))
        .route("/sse/counter", get(display::counter_stream))
}
