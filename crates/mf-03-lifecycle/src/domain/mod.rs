//! # Domain Layer
//!
//! Command inputs, the status graph and pure transition planners.

pub mod commands;
pub mod paging;
pub mod transitions;

pub use commands::{
    CancellationReport, CompleteMatch, MatchUpdate, RecordResult, ReportResult,
    ValidationDecision,
};
pub use paging::PaginationConfig;
pub use transitions::{is_edge, Operation};
