//! # Read-Through Cache (mf-02)
//!
//! Per-match and per-list-query cache in front of the match store.
//!
//! ## Rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Read-through | a miss loads from the store and stores with a fixed TTL |
//! | Invalidate on write | every mutation drops `match:{id}` and all list keys before returning |
//! | Degrade silently | backend errors and timeouts fall back to the store, never fail the caller |
//!
//! A stale read within the TTL and before invalidation is accepted; a stale
//! read after invalidation is a bug.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryCache;
pub use domain::{list_key, match_key, CacheConfig, CacheError, LIST_PREFIX};
pub use ports::CacheBackend;
pub use service::{CacheStats, MatchCache};
