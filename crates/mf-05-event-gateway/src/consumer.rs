//! # Inbound Consumer
//!
//! Single worker per queue consumer. Deliveries are processed strictly one at
//! a time; the queue's prefetch window keeps at most one unacknowledged.
//!
//! ```text
//! recv ──→ decode ──malformed──→ ack + record
//!             │
//!             ▼
//!          handler ──Ok──→ ack (partial failures recorded)
//!             │
//!             └──Err──→ Disposition::for_error
//!                          ├─ Requeue ──→ backoff, nack(requeue)
//!                          └─ AckAndRecord ──→ ack + record
//! ```

use crate::domain::{decode_inbound, Disposition, FailureClass, FailureLedger, RecordedFailure};
use crate::ports::InboundEventHandler;
use chrono::Utc;
use shared_bus::{Delivery, EventEnvelope, QueueConsumer};
use shared_types::{ErrorKind, InboundEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Consumer tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Pause before a requeue, so a failing message does not spin.
    pub nack_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            nack_backoff: Duration::from_millis(200),
        }
    }
}

/// Settlement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub processed: u64,
    pub acked: u64,
    pub requeued: u64,
    pub recorded: u64,
}

#[derive(Default)]
struct Counters {
    processed: AtomicU64,
    acked: AtomicU64,
    requeued: AtomicU64,
    recorded: AtomicU64,
}

/// Decodes deliveries, dispatches them and settles them.
pub struct EventConsumer<H> {
    handler: Arc<H>,
    ledger: Arc<FailureLedger>,
    config: ConsumerConfig,
    counters: Counters,
}

impl<H: InboundEventHandler> EventConsumer<H> {
    pub fn new(handler: Arc<H>, ledger: Arc<FailureLedger>, config: ConsumerConfig) -> Self {
        Self {
            handler,
            ledger,
            config,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<FailureLedger> {
        &self.ledger
    }

    #[must_use]
    pub fn stats(&self) -> ConsumerStats {
        ConsumerStats {
            processed: self.counters.processed.load(Ordering::Relaxed),
            acked: self.counters.acked.load(Ordering::Relaxed),
            requeued: self.counters.requeued.load(Ordering::Relaxed),
            recorded: self.counters.recorded.load(Ordering::Relaxed),
        }
    }

    /// Pull and settle deliveries until shutdown is signalled or the queue
    /// closes. An in-flight delivery is always settled before returning.
    pub async fn run(&self, mut consumer: QueueConsumer, mut shutdown: watch::Receiver<bool>) {
        info!(queue = consumer.queue_name(), "Event consumer started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                delivery = consumer.recv() => match delivery {
                    Some(delivery) => self.settle(delivery).await,
                    None => break,
                },
            }
        }
        info!(queue = consumer.queue_name(), "Event consumer stopped");
    }

    /// Process one delivery and acknowledge or requeue it.
    pub async fn settle(&self, delivery: Delivery) {
        let disposition = self.process(delivery.envelope(), delivery.delivery_count()).await;
        match disposition {
            Disposition::Ack | Disposition::AckAndRecord => {
                self.counters.acked.fetch_add(1, Ordering::Relaxed);
                delivery.ack();
            }
            Disposition::Requeue => {
                self.counters.requeued.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(self.config.nack_backoff).await;
                delivery.nack(true);
            }
        }
    }

    /// Decode and dispatch one envelope; returns how it should be settled.
    pub async fn process(&self, envelope: &EventEnvelope, delivery_count: u32) -> Disposition {
        self.counters.processed.fetch_add(1, Ordering::Relaxed);
        debug!(
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            routing_key = %envelope.routing_key,
            delivery_count,
            "Processing inbound event"
        );

        let event = match decode_inbound(envelope) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    event_id = %envelope.event_id,
                    routing_key = %envelope.routing_key,
                    error = %e,
                    "Malformed inbound event, acknowledging without retry"
                );
                self.record(envelope, FailureClass::Malformed, e.to_string());
                return Disposition::AckAndRecord;
            }
        };

        if let InboundEvent::Unknown { event_type } = &event {
            warn!(%event_type, routing_key = %envelope.routing_key, "Unknown event type, acknowledging");
            return Disposition::Ack;
        }

        let name = event.name().to_string();
        match self.handler.handle(event).await {
            Ok(outcome) => {
                for reason in outcome.partial_failures {
                    self.record(envelope, FailureClass::PartialSeed, reason);
                }
                debug!(event = %name, "Inbound event handled");
                Disposition::Ack
            }
            Err(err) => {
                let disposition = Disposition::for_error(&err);
                match disposition {
                    Disposition::Requeue => warn!(
                        event = %name,
                        delivery_count,
                        error = %err,
                        "Inbound event failed transiently, requeueing"
                    ),
                    _ => {
                        if err.kind() == ErrorKind::Integrity {
                            error!(event = %name, error = %err, "Bracket inconsistency, operator attention required");
                        } else {
                            warn!(event = %name, error = %err, "Inbound event rejected, acknowledging");
                        }
                        let class = match err.kind() {
                            ErrorKind::NotFound => FailureClass::NotFound,
                            ErrorKind::Integrity => FailureClass::Integrity,
                            _ => FailureClass::Validation,
                        };
                        self.record(envelope, class, err.to_string());
                    }
                }
                disposition
            }
        }
    }

    fn record(&self, envelope: &EventEnvelope, class: FailureClass, reason: String) {
        self.counters.recorded.fetch_add(1, Ordering::Relaxed);
        self.ledger.record(RecordedFailure {
            event_id: envelope.event_id,
            event_type: envelope.event_type.clone(),
            routing_key: envelope.routing_key.clone(),
            class,
            reason,
            recorded_at: Utc::now(),
        });
    }
}
