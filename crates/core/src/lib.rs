//! Shared domain types for the qdesk queue counter.
//!
//! Everything here is used by both the server (`qdesk-api`) and the
//! standalone print agent (`qdesk-agent`), so the crate stays free of
//! database and HTTP dependencies.

pub mod dispatch;
pub mod error;
pub mod event_names;
pub mod queue_number;
pub mod ticket;
pub mod types;
