//! # Match Store (mf-01)
//!
//! Durable match table and append-only per-player results.
//!
//! ## Contract
//!
//! | Operation | Behavior |
//! |-----------|----------|
//! | `get_by_id` | live row or `NotFound` |
//! | `get_by_key` | live row at `(tournament, round, match_number)` |
//! | `create` | `Scheduled`, zero scores; `DuplicateKey` among live rows |
//! | `conditional_update` | applies only if the [`WriteGuard`] holds at write time |
//! | `list` | live rows ordered by `(round, match_number)`, paged |
//! | `soft_delete` | hides the row and frees its natural key |
//!
//! `conditional_update` is the only concurrency control shared by the
//! command path and the event path. Nothing above the store takes a lock.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Store errors and the write guard
//! - `ports/` - `MatchStore` and `ResultStore` traits
//! - `adapters/` - In-memory tables and the timeout decorator

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryMatchStore, InMemoryResultStore, TimedStore};
pub use domain::{StoreError, StoreResult, WriteGuard};
pub use ports::{MatchStore, ResultStore};
