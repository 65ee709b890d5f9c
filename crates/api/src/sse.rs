//! Server-sent event streams backed by hub subscriptions.
//!
//! Each frame is `event: <type>` followed by `data: <envelope json>`.
//! Keep-alive comments (`: heartbeat`) are sent every
//! `SSE_HEARTBEAT_SECS` so proxies do not close idle streams; clients
//! ignore them.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use qdesk_core::dispatch::EventEnvelope;
use qdesk_events::Subscription;

/// Keep-alive comment text.
pub const HEARTBEAT_TEXT: &str = "heartbeat";

/// Turn a hub subscription into an SSE response.
///
/// The subscription is owned by the response body, so the subscriber is
/// unregistered as soon as the client disconnects and the body is dropped.
pub fn event_stream(
    subscription: Subscription,
    heartbeat: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = subscription.map(|envelope| Ok(to_sse_event(&envelope)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(heartbeat).text(HEARTBEAT_TEXT))
}

fn to_sse_event(envelope: &EventEnvelope) -> Event {
    match Event::default().event(&envelope.event_type).json_data(envelope) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, event_type = %envelope.event_type, "Failed to encode event");
            Event::default().comment("dropped unencodable event")
        }
    }
}
