//! Event type tags carried in the `event:` line of every stream frame.

/// A counter called a queue number.
pub const EVENT_QUEUE_CALLED: &str = "queue_called";

/// A new ticket was issued.
pub const EVENT_QUEUE_ADDED: &str = "queue_added";

/// Waiting counts changed (served, cancelled, swept).
pub const EVENT_QUEUE_UPDATED: &str = "queue_updated";

/// A print job became pending and can be claimed.
pub const EVENT_PRINT_JOB: &str = "print_job";

/// A print job changed state (claimed, completed, failed, requeued).
pub const EVENT_PRINT_JOB_UPDATED: &str = "print_job_updated";
