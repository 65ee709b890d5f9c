//! Wire types for the print-agent dispatch protocol and the event stream.
//!
//! The server serializes these and the agent deserializes them, so any
//! field change here is a protocol change.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// The JSON body carried on every `data:` line of an event stream.
///
/// `event_type` duplicates the frame's `event:` line so a consumer that
/// only reads `data:` lines can still dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Build an envelope from any serializable payload.
    pub fn new(event_type: impl Into<String>, data: impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            event_type: event_type.into(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// A print job as seen by an agent: everything needed to print without a
/// second read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJobRecord {
    pub id: DbId,
    pub queue_number: String,
    pub type_name: String,
    pub date_time: String,
    /// Serialized [`TicketTemplate`](crate::ticket::TicketTemplate).
    pub template_json: String,
    pub status: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Payload of a `print_job` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJobNotice {
    pub job_id: DbId,
    pub queue_number: String,
}

/// Payload of a `print_job_updated` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJobUpdate {
    pub job_id: DbId,
    pub queue_number: String,
    pub status: String,
    pub agent_id: Option<String>,
    pub error: Option<String>,
}

/// Body of `POST /print-agent/job/{id}/claim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub agent_id: String,
}

/// Body of `POST /print-agent/job/{id}/complete`.
///
/// When `agent_id` is present the server checks it against the claimant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Body of `POST /print-agent/job/{id}/fail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailRequest {
    pub error: String,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Payload of a `queue_called` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueCalledPayload {
    pub entry_id: DbId,
    pub queue_number: String,
    pub counter: String,
    pub service_type: String,
    pub waiting_count: i64,
}

/// Payload of `queue_added` and `queue_updated` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueCountPayload {
    pub queue_number: Option<String>,
    pub status: Option<String>,
    pub waiting_count: i64,
}
