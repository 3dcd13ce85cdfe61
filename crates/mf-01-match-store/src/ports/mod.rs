//! # Ports Layer
//!
//! - `inbound.rs` - Store API used by the lifecycle engine and propagation handler

pub mod inbound;

pub use inbound::{MatchStore, ResultStore};
