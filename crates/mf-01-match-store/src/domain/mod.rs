//! # Domain Layer
//!
//! Store errors and the write-guard value object.

pub mod errors;
pub mod guard;

pub use errors::{StoreError, StoreResult};
pub use guard::WriteGuard;
