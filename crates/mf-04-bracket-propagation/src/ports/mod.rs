//! # Ports Layer
//!
//! - `inbound.rs` - `BracketPropagationApi`
//!
//! Outbound dependencies are the store, cache and event-sink ports of
//! `mf-01`, `mf-02` and `mf-05`.

pub mod inbound;

pub use inbound::BracketPropagationApi;
