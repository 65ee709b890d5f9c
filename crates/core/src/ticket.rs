//! Ticket template and ticket data handed to the printing collaborator.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const DEFAULT_HEADER: &str = "SISTEM ANTRIAN";
pub const DEFAULT_TITLE: &str = "NOMOR ANTRIAN ANDA";
pub const DEFAULT_FOOTER_1: &str = "Mohon menunggu hingga";
pub const DEFAULT_FOOTER_2: &str = "nomor Anda dipanggil";
pub const DEFAULT_THANKS: &str = "Terima kasih";

/// Display format for the date/time line printed on a ticket.
pub const TICKET_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Admin-editable layout of a printed ticket.
///
/// Keys are PascalCase on the wire (`"ShowThanks": false`). Missing keys
/// take the values of [`TicketTemplate::default`], not the type's zero
/// value: a partial template such as `{"ShowThanks": false}` hides only the
/// thanks line and keeps every other section shown with the stock texts.
/// Templates saved through the settings endpoint always carry every key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TicketTemplate {
    pub header: String,
    pub subheader: String,
    pub title: String,
    pub footer1: String,
    pub footer2: String,
    pub thanks: String,
    pub show_subheader: bool,
    pub show_type: bool,
    pub show_datetime: bool,
    pub show_footer: bool,
    pub show_thanks: bool,
}

impl Default for TicketTemplate {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.into(),
            subheader: String::new(),
            title: DEFAULT_TITLE.into(),
            footer1: DEFAULT_FOOTER_1.into(),
            footer2: DEFAULT_FOOTER_2.into(),
            thanks: DEFAULT_THANKS.into(),
            show_subheader: true,
            show_type: true,
            show_datetime: true,
            show_footer: true,
            show_thanks: true,
        }
    }
}

impl TicketTemplate {
    /// Parse a stored template, reporting malformed JSON as a validation error.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid ticket template: {e}")))
    }

    /// Serialize for storage in a print job.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Internal(e.to_string()))
    }
}

/// The per-ticket values printed through a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketData {
    pub queue_number: String,
    pub type_name: String,
    pub date_time: String,
}

/// Format a timestamp the way it appears on a printed ticket.
pub fn format_ticket_datetime(ts: Timestamp) -> String {
    ts.format(TICKET_DATETIME_FORMAT).to_string()
}
