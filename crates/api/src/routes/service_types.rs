use axum::routing::get;
use axum::Router;

use crate::handlers::service_types;
use crate::state::AppState;

/// Routes mounted at `/service-types`.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(service_types::list_service_types).post(service_types::create_service_type),
    )
}
