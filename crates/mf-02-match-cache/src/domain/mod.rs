//! # Domain Layer
//!
//! Key layout, configuration and backend errors.

pub mod config;
pub mod errors;
pub mod keys;

pub use config::CacheConfig;
pub use errors::CacheError;
pub use keys::{list_key, match_key, LIST_PREFIX};
