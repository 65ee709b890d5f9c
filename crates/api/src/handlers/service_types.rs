//! Handlers for the `/service-types` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use qdesk_core::queue_number::ServiceTypeNaming;
use qdesk_db::models::service_type::{CreateServiceType, ServiceType};
use qdesk_db::repositories::ServiceTypeRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/service-types
pub async fn list_service_types(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ServiceType>>>> {
    let data = ServiceTypeRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/service-types
///
/// Returns 201 with the created type; 409 if the prefix is taken.
pub async fn create_service_type(
    State(state): State<AppState>,
    Json(input): Json<CreateServiceType>,
) -> AppResult<impl IntoResponse> {
    let naming = ServiceTypeNaming::new(&input.name, &input.prefix);
    naming.check()?;

    let created = ServiceTypeRepo::create(&state.pool, &naming.name, &naming.prefix, Utc::now()).await?;
    tracing::info!(service_type_id = created.id, prefix = %created.prefix, "Service type created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}
