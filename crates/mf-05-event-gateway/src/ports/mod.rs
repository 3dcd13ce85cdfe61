//! # Ports Layer
//!
//! - `inbound.rs` - Handler the consumer dispatches decoded events to
//! - `outbound.rs` - Sink the engines announce state changes through

pub mod inbound;
pub mod outbound;

pub use inbound::{HandlerOutcome, InboundEventHandler};
pub use outbound::MatchEventSink;
