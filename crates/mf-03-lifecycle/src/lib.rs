//! # Lifecycle Engine (mf-03)
//!
//! Enforces the match state machine and announces every transition.
//!
//! ## Transitions
//!
//! | Operation | From | To | Event |
//! |-----------|------|----|-------|
//! | create | - | Scheduled | `match.created` |
//! | start | Scheduled, both slots filled | InProgress | `match.started` |
//! | report_result | InProgress | PendingValidation | `match.result.reported` |
//! | validate (accept) | PendingValidation | Completed | `match.finished` |
//! | validate (reject) | PendingValidation | InProgress | `match.result.rejected` |
//! | complete | InProgress, scores differ | Completed | `match.completed` |
//! | cancel | any non-terminal | Cancelled | `match.cancelled` |
//! | update | any non-terminal | unchanged | `match.updated` |
//! | delete | anything but Completed | (soft-deleted) | `match.deleted` |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Commands, status graph, pure transition planners
//! - `ports/` - `MatchLifecycleApi`
//! - `service.rs` - `LifecycleService` wiring store, cache and event sink

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    is_edge, CancellationReport, CompleteMatch, MatchUpdate, Operation, PaginationConfig,
    RecordResult, ReportResult, ValidationDecision,
};
pub use ports::MatchLifecycleApi;
pub use service::LifecycleService;
