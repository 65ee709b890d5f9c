//! Best-effort event publication.
//!
//! Every helper here is called after the corresponding state change has
//! committed. Publishing never fails the caller: encoding errors are logged
//! and full subscriber buffers are only counted.

use qdesk_core::dispatch::{
    EventEnvelope, PrintJobNotice, QueueCalledPayload, QueueCountPayload,
};
use qdesk_core::event_names::{
    EVENT_PRINT_JOB, EVENT_PRINT_JOB_UPDATED, EVENT_QUEUE_ADDED, EVENT_QUEUE_CALLED,
    EVENT_QUEUE_UPDATED,
};
use qdesk_db::models::print_job::PrintJob;
use qdesk_db::models::queue_entry::QueueEntry;
use qdesk_db::repositories::QueueEntryRepo;
use qdesk_db::DbPool;
use qdesk_events::{Audience, EventHub};
use serde::Serialize;

/// Audiences that follow the queue itself.
const QUEUE_AUDIENCES: [Audience; 2] = [Audience::Display, Audience::Counter];

/// Publish `payload` as `event_type` to each audience.
pub fn publish<T: Serialize>(hub: &EventHub, audiences: &[Audience], event_type: &str, payload: &T) {
    let envelope = match EventEnvelope::new(event_type, payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(error = %e, event_type, "Failed to encode event payload");
            return;
        }
    };

    for &audience in audiences {
        let report = hub.publish(audience, envelope.clone());
        tracing::debug!(
            event_type,
            audience = %audience,
            delivered = report.delivered,
            dropped = report.dropped,
            "Event published",
        );
    }
}

/// Waiting count to attach to a queue event. A read failure skips the
/// event rather than failing the already-committed change.
pub async fn current_waiting(pool: &DbPool) -> Option<i64> {
    match QueueEntryRepo::waiting_count(pool).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read waiting count, queue event skipped");
            None
        }
    }
}

/// A pending job is ready to be claimed.
pub fn print_job_ready(hub: &EventHub, job: &PrintJob) {
    let notice = PrintJobNotice {
        job_id: job.id,
        queue_number: job.queue_number.clone(),
    };
    publish(hub, &[Audience::PrintAgent], EVENT_PRINT_JOB, &notice);
}

/// A job changed state; counters show print status.
pub fn print_job_updated(hub: &EventHub, job: &PrintJob) {
    publish(hub, &[Audience::Counter], EVENT_PRINT_JOB_UPDATED, &job.to_update());
}

/// A new ticket joined the queue.
pub fn queue_added(hub: &EventHub, entry: &QueueEntry, waiting_count: i64) {
    let payload = QueueCountPayload {
        queue_number: Some(entry.queue_number.clone()),
        status: Some(entry.status.clone()),
        waiting_count,
    };
    publish(hub, &QUEUE_AUDIENCES, EVENT_QUEUE_ADDED, &payload);
}

/// A counter called `entry`.
pub fn queue_called(hub: &EventHub, entry: &QueueEntry, waiting_count: i64) {
    let payload = QueueCalledPayload {
        entry_id: entry.id,
        queue_number: entry.queue_number.clone(),
        counter: entry.counter.clone().unwrap_or_default(),
        service_type: entry.service_type_name.clone(),
        waiting_count,
    };
    publish(hub, &QUEUE_AUDIENCES, EVENT_QUEUE_CALLED, &payload);
}

/// Waiting counts changed, optionally because of `entry`.
pub fn queue_updated(hub: &EventHub, entry: Option<&QueueEntry>, waiting_count: i64) {
    let payload = QueueCountPayload {
        queue_number: entry.map(|e| e.queue_number.clone()),
        status: entry.map(|e| e.status.clone()),
        waiting_count,
    };
    publish(hub, &QUEUE_AUDIENCES, EVENT_QUEUE_UPDATED, &payload);
}
