//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` (or a connection, when the caller needs to compose
//! several writes in one transaction) as the first argument.

pub mod print_job_repo;
pub mod queue_entry_repo;
pub mod service_type_repo;
pub mod setting_repo;

pub use print_job_repo::PrintJobRepo;
pub use queue_entry_repo::QueueEntryRepo;
pub use service_type_repo::ServiceTypeRepo;
pub use setting_repo::SettingRepo;

/// Default page size for list endpoints.
pub(crate) const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for list endpoints.
pub(crate) const MAX_LIMIT: i64 = 200;

/// Clamp optional pagination parameters.
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        offset.unwrap_or(0).max(0),
    )
}
