//! # Ports Layer
//!
//! - `outbound.rs` - Cache backend the read-through cache depends on

pub mod outbound;

pub use outbound::CacheBackend;
