//! Producer-side logic shared by handlers and background tasks.

pub mod publisher;
pub mod ticketing;
