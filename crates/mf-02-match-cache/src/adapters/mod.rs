//! # Adapters
//!
//! - `memory`: in-process TTL backend with fault injection

pub mod memory;

pub use memory::InMemoryCache;
