//! # Shared Bus - Topic Exchange for Match Events
//!
//! Carries [`EventEnvelope`]s between the match service and its upstream
//! tournament and bracket services.
//!
//! ## Topology
//!
//! ```text
//!                         ┌─────────────────────────┐
//!  publish(envelope) ───→ │   tournaments_exchange  │
//!                         │       (topic)           │
//!                         └──────┬──────────┬───────┘
//!                   binding match│          │broadcast
//!                                ▼          ▼
//!                  ┌──────────────────┐  ┌─────────────┐
//!                  │ durable queue    │  │ observers   │
//!                  │ ack / nack       │  │ (no ack)    │
//!                  └──────────────────┘  └─────────────┘
//! ```
//!
//! - Queues give at-least-once delivery with explicit acknowledgement.
//! - Observers are fire-and-forget; tests and metrics use them.
//! - Messages exceeding a queue's delivery limit land on [`DLQ_TOPIC`].

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod queue;
pub mod subscriber;

pub use events::{topic_matches, EventEnvelope, EventFilter};
pub use publisher::{BusError, EventPublisher, InMemoryEventBus};
pub use queue::{Delivery, QueueConsumer, QueueSpec, QueueStats};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per observer before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Topic exchange shared with the tournament and bracket services.
pub const DEFAULT_EXCHANGE: &str = "tournaments_exchange";

/// Dead-letter topic for messages that exhausted their deliveries.
pub const DLQ_TOPIC: &str = "dlq.matches";
