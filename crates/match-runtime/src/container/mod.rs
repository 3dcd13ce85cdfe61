//! # Service Container
//!
//! Configuration plus the composition root that owns every subsystem.
//! Nothing below this crate reaches for a global client; all handles are
//! injected here.

pub mod config;
pub mod services;

pub use config::{BusConfig, ConfigError, RuntimeConfig, StoreConfig};
pub use services::ServiceContainer;
