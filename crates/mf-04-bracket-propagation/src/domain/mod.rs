//! # Domain Layer
//!
//! Slot merge rules and propagation outcomes. No I/O.

pub mod merge;
pub mod outcome;

pub use merge::{plan_slot, validate_key, validate_seed, SlotMerge};
pub use outcome::{PropagationOutcome, SeedingReport};
