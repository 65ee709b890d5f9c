//! Shared response envelope types for API handlers.
//!
//! Admin and display endpoints use a `{ "data": ... }` envelope. The
//! print-agent endpoints return bare records because the agent protocol
//! is a fixed wire contract.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
