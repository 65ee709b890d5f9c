//! Subscriber registry and fan-out.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use futures::Stream;
use qdesk_core::dispatch::EventEnvelope;
use qdesk_core::types::Timestamp;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::audience::Audience;

/// Default outbound buffer per subscriber.
pub const DEFAULT_BUFFER: usize = 64;

/// Identifies one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId {
    pub audience: Audience,
    pub id: Uuid,
}

/// Outcome of a single [`EventHub::publish`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the event was enqueued for.
    pub delivered: usize,
    /// Subscribers whose buffer was full; the event is lost for them.
    pub dropped: usize,
}

struct Subscriber {
    agent_id: Option<String>,
    sender: mpsc::Sender<Arc<EventEnvelope>>,
    connected_at: Timestamp,
}

type Registry = HashMap<Audience, HashMap<Uuid, Subscriber>>;

/// Broadcasts events to every current subscriber of an audience group.
///
/// The registry is guarded by a synchronous `RwLock` that is never held
/// across an `.await`: `publish` only calls `try_send`, so registration,
/// unregistration and publishing all take the lock briefly. Designed to be
/// shared as `Arc<EventHub>`.
pub struct EventHub {
    registry: RwLock<Registry>,
    buffer: usize,
}

impl EventHub {
    /// Create a hub whose subscribers each buffer up to `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber in `audience`.
    ///
    /// The subscriber receives every event published from now on; there is
    /// no replay of earlier events.
    pub fn register(self: &Arc<Self>, audience: Audience, agent_id: Option<String>) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = SubscriberId {
            audience,
            id: Uuid::new_v4(),
        };

        tracing::debug!(
            subscriber = %id.id,
            audience = %audience,
            agent_id = agent_id.as_deref().unwrap_or("-"),
            "Subscriber registered",
        );

        self.write().entry(audience).or_default().insert(
            id.id,
            Subscriber {
                agent_id,
                sender,
                connected_at: chrono::Utc::now(),
            },
        );

        Subscription {
            id,
            receiver,
            hub: Arc::clone(self),
        }
    }

    /// Remove a subscriber. Unknown or already-removed ids are ignored.
    pub fn unregister(&self, id: SubscriberId) {
        let removed = self
            .write()
            .get_mut(&id.audience)
            .and_then(|group| group.remove(&id.id));

        if let Some(sub) = removed {
            let connected_secs = (chrono::Utc::now() - sub.connected_at).num_seconds();
            tracing::debug!(
                subscriber = %id.id,
                audience = %id.audience,
                agent_id = sub.agent_id.as_deref().unwrap_or("-"),
                connected_secs,
                "Subscriber unregistered",
            );
        }
    }

    /// Enqueue `event` for every subscriber of `audience` without waiting.
    ///
    /// A subscriber whose buffer is full misses this event. Subscribers
    /// whose receiving half is gone are pruned.
    pub fn publish(&self, audience: Audience, event: EventEnvelope) -> PublishReport {
        let event = Arc::new(event);
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        {
            let registry = self.read();
            let Some(group) = registry.get(&audience) else {
                return report;
            };

            for (id, sub) in group {
                match sub.sender.try_send(Arc::clone(&event)) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        tracing::warn!(
                            subscriber = %id,
                            audience = %audience,
                            event_type = %event.event_type,
                            "Subscriber buffer full, event dropped",
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut registry = self.write();
            if let Some(group) = registry.get_mut(&audience) {
                for id in &closed {
                    group.remove(id);
                }
            }
            tracing::debug!(audience = %audience, pruned = closed.len(), "Pruned closed subscribers");
        }

        report
    }

    /// Number of subscribers currently registered in `audience`.
    pub fn subscriber_count(&self, audience: Audience) -> usize {
        self.read().get(&audience).map_or(0, HashMap::len)
    }

    /// Number of subscribers across all groups.
    pub fn total_subscribers(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    /// Drop every subscriber so their streams end.
    ///
    /// Used during graceful shutdown. Returns the number of subscribers
    /// that were closed.
    pub fn shutdown_all(&self) -> usize {
        let mut registry = self.write();
        let count = registry.values().map(HashMap::len).sum();
        registry.clear();
        tracing::info!(count, "Closed all event subscribers");
        count
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

/// Receiving half of a registered subscriber.
///
/// Yields events in publish order. The stream ends once the hub drops the
/// subscriber (see [`EventHub::shutdown_all`]). Dropping the subscription
/// unregisters it.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<EventEnvelope>>,
    hub: Arc<EventHub>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once the hub has closed this
    /// subscriber.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = Arc<EventEnvelope>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}
