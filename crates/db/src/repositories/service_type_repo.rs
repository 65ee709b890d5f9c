use qdesk_core::types::{DbId, Timestamp};

use crate::models::service_type::ServiceType;
use crate::DbPool;

const COLUMNS: &str = "id, name, prefix, is_active, created_at";

/// Provides CRUD operations for service types.
pub struct ServiceTypeRepo;

impl ServiceTypeRepo {
    pub async fn list(pool: &DbPool) -> Result<Vec<ServiceType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_types ORDER BY id");
        sqlx::query_as::<_, ServiceType>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<ServiceType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_types WHERE id = ?1");
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new active service type. A duplicate prefix fails with a
    /// unique violation.
    pub async fn create(
        pool: &DbPool,
        name: &str,
        prefix: &str,
        now: Timestamp,
    ) -> Result<ServiceType, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_types (name, prefix, is_active, created_at) \
             VALUES (?1, ?2, 1, ?3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(name)
            .bind(prefix)
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
