//! # Event Handlers
//!
//! Inbound event routing for the match service.

pub mod inbound;

pub use inbound::{InboundRouter, TOURNAMENT_DELETED_REASON};
