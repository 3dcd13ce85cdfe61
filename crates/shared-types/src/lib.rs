//! # Shared Types Crate
//!
//! This crate contains the match entities, the error taxonomy and the typed
//! event payloads shared by every match subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Typed events**: Wire payloads are decoded once into [`InboundEvent`]
//!   variants; handlers never look at untyped maps.
//! - **Natural key vs. id**: [`MatchKey`] is the bracket position used for
//!   merging, [`MatchId`] is the handle used by clients and caches.

pub mod entities;
pub mod errors;
pub mod events;

pub use entities::*;
pub use errors::*;
pub use events::*;
