//! # Bracket Propagation (mf-04)
//!
//! Writes a finished match's winner into the slot of the match it feeds,
//! and seeds first-round matches when a bracket is generated.
//!
//! ## Architecture Role
//!
//! ```text
//! [Event Gateway (5)] ──WinnerAdvanced──→ [Bracket Propagation (4)]
//!                     ──BracketGenerated─→        │
//!                                                 ↓ conditional write
//!                                          [Match Store (1)] + cache invalidation
//!                                                 │
//!                                                 ↓ match.created / match.updated
//!                                          [Event Sink]
//! ```
//!
//! ## Guarantees
//!
//! - Duplicate and out-of-order advancements converge on the same row.
//! - A slot holding a different player is never overwritten.
//! - Readiness (both slots filled) is logged; status is left `Scheduled`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{PropagationOutcome, SeedingReport, SlotMerge};
pub use ports::BracketPropagationApi;
pub use service::BracketPropagator;
