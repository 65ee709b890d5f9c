//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` input DTOs accepted by the HTTP layer

pub mod print_job;
pub mod queue_entry;
pub mod service_type;
pub mod setting;
pub mod status;
