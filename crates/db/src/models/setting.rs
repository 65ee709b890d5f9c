//! Key/value settings.

/// Key under which the ticket template JSON is stored.
pub const SETTING_TICKET_TEMPLATE: &str = "ticket_template";
