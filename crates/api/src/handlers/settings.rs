//! Ticket template setting.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use qdesk_core::ticket::TicketTemplate;
use qdesk_db::models::setting::SETTING_TICKET_TEMPLATE;
use qdesk_db::repositories::SettingRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/settings/ticket-template
///
/// The stored template, or the default if none was saved. A stored value
/// that no longer parses is reported as a validation error.
pub async fn get_ticket_template(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<TicketTemplate>>> {
    let template = match SettingRepo::get(&state.pool, SETTING_TICKET_TEMPLATE).await? {
        Some(raw) => TicketTemplate::parse(&raw)?,
        None => TicketTemplate::default(),
    };
    Ok(Json(DataResponse { data: template }))
}

/// PUT /api/v1/settings/ticket-template
///
/// Applies to print jobs created afterwards; existing jobs keep the
/// template they were created with.
pub async fn put_ticket_template(
    State(state): State<AppState>,
    Json(template): Json<TicketTemplate>,
) -> AppResult<Json<DataResponse<TicketTemplate>>> {
    let raw = template.to_json()?;
    SettingRepo::put(&state.pool, SETTING_TICKET_TEMPLATE, &raw, Utc::now()).await?;
    tracing::info!("Ticket template updated");
    Ok(Json(DataResponse { data: template }))
}
