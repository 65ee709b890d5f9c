pub mod display;
pub mod health;
pub mod print_agent;
pub mod print_jobs;
pub mod queue;
pub mod service_types;
pub mod settings;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /print-agent/jobs/pending                  pending jobs (catch-up)
/// /print-agent/sse?agent_id=                 print_job stream
/// /print-agent/job/{id}/claim                claim (POST)
/// /print-agent/job/{id}/complete             complete (POST)
/// /print-agent/job/{id}/fail                 fail (POST)
///
/// /sse/display                               display stream
/// /sse/counter                               counter stream
/// /display/state                             display snapshot
///
/// /queue                                     list
/// /queue/tickets                             issue (POST)
/// /queue/call-next                           call next (POST)
/// /queue/{id}/recall                         recall (POST)
/// /queue/{id}/serve                          serve (POST)
/// /queue/{id}/cancel                         cancel (POST)
///
/// /service-types                             list, create
/// /print-jobs                                list
/// /print-jobs/{id}                           get
/// /print-jobs/{id}/requeue                   requeue (POST)
/// /settings/ticket-template                  get, put
/// ```
///
/// `request_timeout` applies to every route except the event streams,
/// which stay open indefinitely.
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    let timed = Router::new()
        .nest("/print-agent", print_agent::router())
        .nest("/display", display::router())
        .nest("/queue", queue::router())
        .nest("/service-types", service_types::router())
        .nest("/print-jobs", print_jobs::router())
        .nest("/settings", settings::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    timed
        .merge(print_agent::stream_router())
        .merge(display::stream_router())
}
