use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/ticket-template",
        get(settings::get_ticket_template).put(settings::put_ticket_template),
    )
}
