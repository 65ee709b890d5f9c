use std::sync::Arc;

use qdesk_events::EventHub;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: qdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Subscriber registry for display, counter and print-agent streams.
    pub hub: Arc<EventHub>,
}
