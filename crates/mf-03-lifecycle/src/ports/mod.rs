//! # Ports Layer
//!
//! - `inbound.rs` - Command API exposed to the API layer and the event router
//!
//! Outbound dependencies are the store, cache and event-sink ports of
//! `mf-01`, `mf-02` and `mf-05`.

pub mod inbound;

pub use inbound::MatchLifecycleApi;
