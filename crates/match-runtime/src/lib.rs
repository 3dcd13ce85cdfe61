//! # Match Runtime Library
//!
//! Composition root of the match service, exposed as a library so the
//! integration suite can drive a fully wired process in memory. The
//! entry point is the `main.rs` binary.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and subsystem wiring
//! - `handlers/` - Inbound event routing
//! - `runtime.rs` - Consumer worker and graceful shutdown

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{BusConfig, ConfigError, RuntimeConfig, ServiceContainer, StoreConfig};
pub use handlers::InboundRouter;
pub use runtime::MatchRuntime;
