//! Event sink adapters.

use crate::ports::MatchEventSink;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{EventEnvelope, EventPublisher};
use shared_types::MatchEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Publishes domain events onto the bus.
pub struct BusEventSink<P> {
    publisher: Arc<P>,
    failures: AtomicU64,
}

impl<P: EventPublisher> BusEventSink<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        Self {
            publisher,
            failures: AtomicU64::new(0),
        }
    }

    /// Events that could not be published.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<P: EventPublisher> MatchEventSink for BusEventSink<P> {
    async fn emit(&self, event: MatchEvent) {
        let match_id = event.match_id();
        let envelope = match EventEnvelope::from_match_event(&event) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%match_id, routing_key = event.routing_key(), error = %e, "Failed to encode event");
                return;
            }
        };

        let routing_key = envelope.routing_key.clone();
        match self.publisher.publish(envelope).await {
            Ok(queues) => debug!(%match_id, %routing_key, queues, "Published match event"),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%match_id, %routing_key, error = %e, "Event publish failed, state change kept");
            }
        }
    }
}

/// Keeps every event in memory, for tests and diagnostics.
#[derive(Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<MatchEvent>>,
}

impl RecordingEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<MatchEvent> {
        self.events.read().clone()
    }

    #[must_use]
    pub fn routing_keys(&self) -> Vec<&'static str> {
        self.events.read().iter().map(MatchEvent::routing_key).collect()
    }

    /// How many events were emitted under `routing_key`.
    #[must_use]
    pub fn count(&self, routing_key: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.routing_key() == routing_key)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl MatchEventSink for RecordingEventSink {
    async fn emit(&self, event: MatchEvent) {
        self.events.write().push(event);
    }
}
