//! # Durable Queues
//!
//! Work-queue side of the bus: a named queue bound to routing-key patterns,
//! consumed with explicit acknowledgement.
//!
//! ## Delivery Semantics
//!
//! ```text
//! publish ──→ [ready] ──recv──→ Delivery ──ack──→ (gone)
//!                ↑                  │
//!                └──── nack(requeue) / dropped unsettled
//!                                   │
//!                   deliveries ≥ max_deliveries ──→ dlq.matches
//! ```
//!
//! - At-least-once: an unsettled delivery that is dropped goes back to the
//!   head of the queue.
//! - Prefetch: a consumer holds at most `prefetch` unsettled deliveries.
//! - The queue never deduplicates; consumers must be idempotent.

use crate::events::{topic_matches, EventEnvelope};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, Notify, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, warn};

/// Declaration of a durable queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    /// Topic patterns the queue is bound to.
    pub bindings: Vec<String>,
    /// Maximum unacknowledged deliveries per queue.
    pub prefetch: usize,
    /// Dead-letter a message once it has been delivered this many times.
    pub max_deliveries: Option<u32>,
}

impl QueueSpec {
    pub fn new<I, S>(name: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            bindings: bindings.into_iter().map(Into::into).collect(),
            prefetch: 1,
            max_deliveries: None,
        }
    }

    #[must_use]
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    #[must_use]
    pub fn with_max_deliveries(mut self, max: Option<u32>) -> Self {
        self.max_deliveries = max;
        self
    }

    pub(crate) fn is_bound_to(&self, routing_key: &str) -> bool {
        self.bindings.iter().any(|p| topic_matches(p, routing_key))
    }
}

/// Counters for a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub ready: usize,
    pub acked: u64,
    pub requeued: u64,
    pub dead_lettered: u64,
}

struct QueuedMessage {
    envelope: EventEnvelope,
    /// Times this message has been handed to a consumer so far.
    deliveries: u32,
}

/// Declared queues plus the observer channel.
///
/// Owned by the exchange; queues hold a weak handle so dead letters are
/// routed exactly like published envelopes.
pub(crate) struct Routes {
    queues: RwLock<Vec<Arc<DurableQueue>>>,
    observers: broadcast::Sender<EventEnvelope>,
}

impl Routes {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        let (observers, _) = broadcast::channel(capacity);
        Arc::new(Self {
            queues: RwLock::new(Vec::new()),
            observers,
        })
    }

    pub(crate) fn observers(&self) -> &broadcast::Sender<EventEnvelope> {
        &self.observers
    }

    /// Declare a queue, or return the existing one with the same name.
    ///
    /// The flag is `true` when the queue was created by this call.
    pub(crate) fn declare(self: &Arc<Self>, spec: QueueSpec) -> (Arc<DurableQueue>, bool) {
        let mut queues = self.queues.write();
        if let Some(existing) = queues.iter().find(|q| q.spec().name == spec.name) {
            return (Arc::clone(existing), false);
        }
        let queue = Arc::new(DurableQueue::new(spec, Arc::downgrade(self)));
        queues.push(Arc::clone(&queue));
        (queue, true)
    }

    pub(crate) fn find(&self, name: &str) -> Option<Arc<DurableQueue>> {
        self.queues
            .read()
            .iter()
            .find(|q| q.spec().name == name)
            .cloned()
    }

    pub(crate) fn all(&self) -> Vec<Arc<DurableQueue>> {
        self.queues.read().clone()
    }

    /// Enqueue on every bound queue except `origin`, then notify observers.
    ///
    /// Returns `(queues, observers)` reached.
    pub(crate) fn route(&self, envelope: &EventEnvelope, origin: Option<&str>) -> (usize, usize) {
        let mut routed = 0;
        for queue in self.queues.read().iter() {
            if origin == Some(queue.spec().name.as_str()) {
                continue;
            }
            if queue.spec().is_bound_to(&envelope.routing_key) {
                queue.enqueue(envelope.clone());
                routed += 1;
            }
        }
        // No observers is not an error.
        let observers = self.observers.send(envelope.clone()).unwrap_or(0);
        (routed, observers)
    }
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<QueuedMessage>,
    closed: bool,
}

pub(crate) struct DurableQueue {
    spec: QueueSpec,
    state: Mutex<QueueState>,
    notify: Notify,
    permits: Arc<Semaphore>,
    routes: Weak<Routes>,
    acked: AtomicU64,
    requeued: AtomicU64,
    dead_lettered: AtomicU64,
}

impl DurableQueue {
    fn new(spec: QueueSpec, routes: Weak<Routes>) -> Self {
        let permits = Arc::new(Semaphore::new(spec.prefetch.max(1)));
        Self {
            spec,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            permits,
            routes,
            acked: AtomicU64::new(0),
            requeued: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
        }
    }

    pub(crate) fn spec(&self) -> &QueueSpec {
        &self.spec
    }

    pub(crate) fn enqueue(&self, envelope: EventEnvelope) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.ready.push_back(QueuedMessage {
                envelope,
                deliveries: 0,
            });
        }
        self.notify.notify_one();
    }

    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.permits.close();
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub(crate) fn stats(&self) -> QueueStats {
        QueueStats {
            ready: self.state.lock().ready.len(),
            acked: self.acked.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
        }
    }

    fn requeue(&self, envelope: EventEnvelope, deliveries: u32) {
        if let Some(max) = self.spec.max_deliveries {
            if deliveries >= max {
                self.dead_letter(envelope, deliveries);
                return;
            }
        }
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.ready.push_front(QueuedMessage {
                envelope,
                deliveries,
            });
        }
        self.requeued.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    fn dead_letter(&self, envelope: EventEnvelope, deliveries: u32) {
        warn!(
            queue = %self.spec.name,
            event_id = %envelope.event_id,
            routing_key = %envelope.routing_key,
            deliveries,
            "Message exceeded delivery limit, moving to dead-letter topic"
        );
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);

        let Some(routes) = self.routes.upgrade() else {
            error!(queue = %self.spec.name, event_id = %envelope.event_id, "Exchange gone, dead letter lost");
            return;
        };
        let dead = envelope.dead_lettered(deliveries);
        let (routed, _) = routes.route(&dead, Some(&self.spec.name));
        if routed == 0 {
            warn!(
                queue = %self.spec.name,
                event_id = %envelope.event_id,
                "No queue bound to the dead-letter topic"
            );
        }
    }
}

/// Consumer handle for one queue.
pub struct QueueConsumer {
    queue: Arc<DurableQueue>,
}

impl QueueConsumer {
    pub(crate) fn new(queue: Arc<DurableQueue>) -> Self {
        Self { queue }
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue.spec().name
    }

    /// Wait for the next message.
    ///
    /// Blocks while the prefetch window is full. Returns `None` once the
    /// queue is closed.
    pub async fn recv(&mut self) -> Option<Delivery> {
        let permit = self.queue.permits.clone().acquire_owned().await.ok()?;
        loop {
            {
                let mut state = self.queue.state.lock();
                if let Some(mut message) = state.ready.pop_front() {
                    message.deliveries += 1;
                    debug!(
                        queue = %self.queue.spec.name,
                        event_id = %message.envelope.event_id,
                        deliveries = message.deliveries,
                        "Delivering message"
                    );
                    return Some(Delivery {
                        envelope: message.envelope,
                        deliveries: message.deliveries,
                        queue: Arc::clone(&self.queue),
                        settlement: Settlement::Pending,
                        _permit: permit,
                    });
                }
                if state.closed {
                    return None;
                }
            }
            self.queue.notify.notified().await;
        }
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Pending,
    Acked,
    Requeue,
    Reject,
}

/// A message handed to a consumer, awaiting settlement.
///
/// Dropping a delivery without settling it requeues the message, the same
/// way a broker does when a channel closes with unacked messages.
pub struct Delivery {
    envelope: EventEnvelope,
    deliveries: u32,
    queue: Arc<DurableQueue>,
    settlement: Settlement,
    _permit: OwnedSemaphorePermit,
}

impl Delivery {
    #[must_use]
    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    /// How many times this message has been delivered, including this one.
    #[must_use]
    pub fn delivery_count(&self) -> u32 {
        self.deliveries
    }

    #[must_use]
    pub fn redelivered(&self) -> bool {
        self.deliveries > 1
    }

    /// Acknowledge: the message is removed for good.
    pub fn ack(mut self) {
        self.settlement = Settlement::Acked;
    }

    /// Negative acknowledgement. With `requeue` the message goes back to the
    /// head of the queue, otherwise it is dead-lettered.
    pub fn nack(mut self, requeue: bool) {
        self.settlement = if requeue {
            Settlement::Requeue
        } else {
            Settlement::Reject
        };
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        match self.settlement {
            Settlement::Acked => {
                self.queue.acked.fetch_add(1, Ordering::Relaxed);
            }
            Settlement::Requeue | Settlement::Pending => {
                self.queue.requeue(self.envelope.clone(), self.deliveries);
            }
            Settlement::Reject => {
                self.queue.dead_letter(self.envelope.clone(), self.deliveries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn queue(max_deliveries: Option<u32>) -> (Arc<DurableQueue>, Arc<Routes>) {
        let routes = Routes::new(16);
        let spec = QueueSpec::new("q", ["bracket.#"]).with_max_deliveries(max_deliveries);
        let (q, created) = routes.declare(spec);
        assert!(created);
        (q, routes)
    }

    fn envelope(key: &str) -> EventEnvelope {
        EventEnvelope::new(key, "T", serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_ack_removes_message() {
        let (q, _dlq) = queue(None);
        q.enqueue(envelope("bracket.a"));
        let mut consumer = QueueConsumer::new(q.clone());

        let delivery = consumer.recv().await.unwrap();
        assert_eq!(delivery.delivery_count(), 1);
        delivery.ack();

        assert_eq!(q.stats().ready, 0);
        assert_eq!(q.stats().acked, 1);
    }

    #[tokio::test]
    async fn test_nack_requeues_at_head() {
        let (q, _dlq) = queue(None);
        q.enqueue(envelope("bracket.first"));
        q.enqueue(envelope("bracket.second"));
        let mut consumer = QueueConsumer::new(q.clone());

        let first = consumer.recv().await.unwrap();
        first.nack(true);

        let again = consumer.recv().await.unwrap();
        assert_eq!(again.envelope().routing_key, "bracket.first");
        assert!(again.redelivered());
        again.ack();
    }

    #[tokio::test]
    async fn test_dropped_delivery_is_requeued() {
        let (q, _dlq) = queue(None);
        q.enqueue(envelope("bracket.a"));
        let mut consumer = QueueConsumer::new(q.clone());

        drop(consumer.recv().await.unwrap());

        let redelivered = consumer.recv().await.unwrap();
        assert_eq!(redelivered.delivery_count(), 2);
        redelivered.ack();
    }

    #[tokio::test]
    async fn test_prefetch_blocks_second_delivery() {
        let (q, _dlq) = queue(None);
        q.enqueue(envelope("bracket.a"));
        q.enqueue(envelope("bracket.b"));
        let mut consumer = QueueConsumer::new(q.clone());
        let mut other = QueueConsumer::new(q.clone());

        let held = consumer.recv().await.unwrap();
        let blocked = timeout(Duration::from_millis(50), other.recv()).await;
        assert!(blocked.is_err(), "prefetch window of one must be full");

        held.ack();
        let next = timeout(Duration::from_millis(100), other.recv())
            .await
            .expect("permit released")
            .unwrap();
        assert_eq!(next.envelope().routing_key, "bracket.b");
        next.ack();
    }

    #[tokio::test]
    async fn test_delivery_limit_dead_letters() {
        let (q, routes) = queue(Some(2));
        let mut observer = routes.observers().subscribe();
        q.enqueue(envelope("bracket.poison"));
        let mut consumer = QueueConsumer::new(q.clone());

        consumer.recv().await.unwrap().nack(true);
        consumer.recv().await.unwrap().nack(true);

        let dead = observer.try_recv().unwrap();
        assert_eq!(dead.routing_key, crate::DLQ_TOPIC);
        assert_eq!(q.stats().ready, 0);
        assert_eq!(q.stats().dead_lettered, 1);
    }

    #[tokio::test]
    async fn test_dead_letter_lands_in_bound_queue_without_observers() {
        let (q, routes) = queue(Some(1));
        let (dlq, _) = routes.declare(QueueSpec::new("dlq", ["dlq.#"]));
        assert_eq!(routes.observers().receiver_count(), 0);

        q.enqueue(envelope("bracket.poison"));
        QueueConsumer::new(q.clone()).recv().await.unwrap().nack(true);

        assert_eq!(q.stats().ready, 0);
        assert_eq!(dlq.stats().ready, 1);
        let dead = QueueConsumer::new(dlq).recv().await.unwrap();
        assert_eq!(dead.envelope().data["original"]["routing_key"], "bracket.poison");
        dead.ack();
    }

    #[tokio::test]
    async fn test_dead_letter_not_routed_back_to_origin() {
        let routes = Routes::new(16);
        let (q, _) = routes.declare(QueueSpec::new("everything", ["#"]).with_max_deliveries(Some(1)));

        q.enqueue(envelope("bracket.poison"));
        QueueConsumer::new(q.clone()).recv().await.unwrap().nack(false);

        assert_eq!(q.stats().ready, 0);
        assert_eq!(q.stats().dead_lettered, 1);
    }

    #[tokio::test]
    async fn test_close_ends_consumer() {
        let (q, _dlq) = queue(None);
        let mut consumer = QueueConsumer::new(q.clone());
        let waiter = tokio::spawn(async move { consumer.recv().await.is_none() });
        tokio::time::sleep(Duration::from_millis(10)).await;
        q.close();
        assert!(timeout(Duration::from_millis(200), waiter).await.unwrap().unwrap());
    }
}
