//! # Adapters
//!
//! - `memory`: in-memory match and result tables with fault injection
//! - `timed`: timeout decorator for any store

pub mod memory;
pub mod timed;

pub use memory::{InMemoryMatchStore, InMemoryResultStore};
pub use timed::TimedStore;
