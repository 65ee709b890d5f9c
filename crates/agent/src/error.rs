use reqwest::StatusCode;

/// Errors talking to the dispatch server.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Transport failure (connect, timeout, broken stream).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an unexpected status.
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The job was already claimed or finished.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The job does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A response or event body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The event stream broke framing.
    #[error(transparent)]
    LineTooLong(#[from] crate::sse::LineTooLong),
}

impl AgentError {
    /// A claim lost to another agent (or made on a finished job). Expected
    /// during catch-up; never retried.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AgentError::Conflict(_) | AgentError::NotFound(_))
    }
}
