//! Service types: the categories a visitor picks when taking a ticket.

use qdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `service_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServiceType {
    pub id: DbId,
    pub name: String,
    pub prefix: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for `POST /api/v1/service-types`.
#[derive(Debug, Deserialize)]
pub struct CreateServiceType {
    pub name: String,
    pub prefix: String,
}
