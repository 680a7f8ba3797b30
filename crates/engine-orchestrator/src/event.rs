//! Explicit orchestrator events: a single [`Event`] enum and a broadcast
//! subscription interface that downstream callers subscribe to for
//! progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Default channel capacity for the orchestrator event bus.
const DEFAULT_CAPACITY: usize = 256;

/// Something the orchestrator wants subscribers to know about.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The orchestrator finished initializing and is accepting operations.
    EngineReady,
    /// A `ingest` operation started.
    IngestionStarted {
        /// The operation's id.
        operation_id: String,
    },
    /// A `ingest` operation finished successfully.
    IngestionComplete {
        /// The operation's id.
        operation_id: String,
        /// Id of the resulting graph.
        graph_id: String,
    },
    /// A `generate` operation started.
    GenerationStarted {
        /// The operation's id.
        operation_id: String,
    },
    /// A `generate` operation finished successfully.
    GenerationComplete {
        /// The operation's id.
        operation_id: String,
        /// Ids of the resulting artifacts.
        artifact_ids: Vec<String>,
    },
    /// Any operation failed.
    Error {
        /// Machine-readable error code.
        kind: String,
        /// Id of the operation that failed, if one was in flight.
        operation_id: Option<String>,
        /// Human-readable detail.
        detail: String,
    },
}

#[derive(Debug, Default)]
struct StatsInner {
    total_published: AtomicU64,
    dropped_events: AtomicU64,
}

/// Broadcast-based event bus distributing [`Event`]s to every subscriber.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    stats: Arc<StatsInner>,
}

impl EventBus {
    /// A new bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A new bus with the given channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, stats: Arc::new(StatsInner::default()) }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription { rx: self.tx.subscribe(), stats: Arc::clone(&self.stats) }
    }

    /// Publish an event to every current subscriber. Silently dropped (and
    /// counted) if nobody is listening.
    pub fn publish(&self, event: Event) {
        self.stats.total_published.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(event).is_err() {
            self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for receiving [`Event`]s from an [`EventBus`].
pub struct EventSubscription {
    rx: broadcast::Receiver<Event>,
    stats: Arc<StatsInner>,
}

impl EventSubscription {
    /// Receive the next event, waiting asynchronously. Returns `None` only
    /// when the bus itself has been dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.stats.dropped_events.fetch_add(n, Ordering::Relaxed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(Event::EngineReady);
        let received = sub.recv().await.unwrap();
        assert!(matches!(received, Event::EngineReady));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(Event::EngineReady);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn two_subscribers_both_receive_the_same_event() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(Event::IngestionStarted { operation_id: "op-1".to_string() });
        assert!(matches!(a.recv().await, Some(Event::IngestionStarted { .. })));
        assert!(matches!(b.recv().await, Some(Event::IngestionStarted { .. })));
    }
}
