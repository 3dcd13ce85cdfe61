//! # Adapters
//!
//! - `sink`: bus-backed and recording event sinks

pub mod sink;

pub use sink::{BusEventSink, RecordingEventSink};
