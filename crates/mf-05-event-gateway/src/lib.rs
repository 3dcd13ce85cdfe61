//! # Event Gateway (mf-05)
//!
//! The match service's edge to the message bus.
//!
//! ## Publish Contract
//!
//! Every committed state change emits exactly one [`shared_types::MatchEvent`]
//! through a [`MatchEventSink`]. Publishing is best effort: an unreachable
//! broker is logged and the triggering operation still succeeds.
//!
//! ## Consume Contract
//!
//! ```text
//! tournaments_exchange ──→ matches_service_queue ──→ EventConsumer ──→ InboundEventHandler
//!   tournament.created                                 (prefetch 1)
//!   tournament.updated
//!   tournament.deleted
//!   tournament.status.*
//!   tournament.bracket.generated
//!   bracket.update.next_match
//! ```
//!
//! Payloads are decoded into typed [`shared_types::InboundEvent`]s once, here.
//! Acknowledgement follows [`Disposition`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod consumer;
pub mod domain;
pub mod ports;

pub use adapters::{BusEventSink, RecordingEventSink};
pub use consumer::{ConsumerConfig, ConsumerStats, EventConsumer};
pub use domain::{
    decode_inbound, DecodeError, Disposition, FailureClass, FailureLedger, RecordedFailure,
};
pub use ports::{HandlerOutcome, InboundEventHandler, MatchEventSink};

/// Queue consumed by the match service.
pub const INBOUND_QUEUE: &str = "matches_service_queue";

/// Routing-key bindings of [`INBOUND_QUEUE`].
pub const INBOUND_BINDINGS: [&str; 6] = [
    shared_types::routing::TOURNAMENT_CREATED,
    shared_types::routing::TOURNAMENT_UPDATED,
    shared_types::routing::TOURNAMENT_DELETED,
    shared_types::routing::TOURNAMENT_STATUS,
    shared_types::routing::BRACKET_GENERATED,
    shared_types::routing::BRACKET_NEXT_MATCH,
];
