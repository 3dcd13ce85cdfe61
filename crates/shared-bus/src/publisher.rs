//! # Event Publisher
//!
//! Publishing side of the bus and the in-memory topic exchange.
//!
//! A published envelope is routed to every durable queue whose bindings
//! match its routing key, and broadcast to every observer subscription.

use crate::events::{EventEnvelope, EventFilter};
use crate::queue::{QueueConsumer, QueueSpec, QueueStats, Routes};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from publishing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker connection is down.
    #[error("Event bus not connected")]
    NotConnected,

    /// The payload could not be encoded.
    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    /// The bus has been shut down.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope.
    ///
    /// Returns the number of queues the envelope was routed to.
    async fn publish(&self, envelope: EventEnvelope) -> Result<usize, BusError>;

    /// Total envelopes accepted for publishing.
    fn events_published(&self) -> u64;
}

/// In-memory topic exchange.
///
/// Uses `tokio::sync::broadcast` for observers and a set of durable queues
/// for work consumers. Suitable for a single process; a broker-backed
/// implementation would sit behind the same [`EventPublisher`] trait.
pub struct InMemoryEventBus {
    /// Exchange name, for logs.
    exchange: String,

    /// Declared queues and the observer channel, dead letters included.
    routes: Arc<Routes>,

    /// Total events published.
    events_published: AtomicU64,

    connected: AtomicBool,
    closed: AtomicBool,

    /// Observer channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with the given observer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            exchange: crate::DEFAULT_EXCHANGE.to_string(),
            routes: Routes::new(capacity),
            events_published: AtomicU64::new(0),
            connected: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Rename the exchange.
    #[must_use]
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Simulate losing or regaining the broker connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        info!(exchange = %self.exchange, connected, "Event bus connection state changed");
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    /// Declare a durable queue (idempotent by name) and attach a consumer.
    ///
    /// Re-declaring an existing name returns another consumer on the same
    /// queue; the original bindings are kept.
    pub fn bind_queue(&self, spec: QueueSpec) -> QueueConsumer {
        let (queue, created) = self.routes.declare(spec);
        if created {
            let spec = queue.spec();
            info!(
                exchange = %self.exchange,
                queue = %spec.name,
                bindings = ?spec.bindings,
                prefetch = spec.prefetch,
                "Declared queue"
            );
        }
        QueueConsumer::new(queue)
    }

    /// Declare a queue without attaching a consumer.
    ///
    /// Messages routed to it are held until someone binds the same name.
    pub fn declare_queue(&self, spec: QueueSpec) {
        drop(self.bind_queue(spec));
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(patterns = ?filter.patterns, "New subscription created");
        Subscription::new(self.routes.observers().subscribe(), filter)
    }

    /// Counters for a named queue.
    #[must_use]
    pub fn queue_stats(&self, name: &str) -> Option<QueueStats> {
        self.routes.find(name).map(|q| q.stats())
    }

    /// Messages waiting in a named queue.
    #[must_use]
    pub fn queue_depth(&self, name: &str) -> usize {
        self.queue_stats(name).map_or(0, |s| s.ready)
    }

    /// Messages dead-lettered across all queues.
    #[must_use]
    pub fn dead_letter_count(&self) -> u64 {
        self.routes.all().iter().map(|q| q.stats().dead_lettered).sum()
    }

    /// Get the number of active observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.routes.observers().receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop accepting publishes and wake every consumer with end-of-queue.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for queue in self.routes.all() {
            queue.close();
        }
        info!(exchange = %self.exchange, "Event bus closed");
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, envelope: EventEnvelope) -> Result<usize, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        if !self.connected.load(Ordering::SeqCst) {
            warn!(
                routing_key = %envelope.routing_key,
                event_type = %envelope.event_type,
                "Publish failed, bus not connected"
            );
            return Err(BusError::NotConnected);
        }

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let (routed, observers) = self.routes.route(&envelope, None);

        debug!(
            exchange = %self.exchange,
            routing_key = %envelope.routing_key,
            event_type = %envelope.event_type,
            queues = routed,
            observers,
            "Event published"
        );
        Ok(routed)
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
