//! # Domain Layer
//!
//! Inbound decoding, the acknowledgement policy and the failure ledger.

pub mod decode;
pub mod disposition;
pub mod ledger;

pub use decode::{decode_inbound, DecodeError};
pub use disposition::Disposition;
pub use ledger::{FailureClass, FailureLedger, RecordedFailure};
