//! Acknowledgement policy.
//!
//! | Handler outcome | Disposition |
//! |-----------------|-------------|
//! | Ok | ack |
//! | malformed payload | ack, failure recorded |
//! | Validation, NotFound, Integrity | ack, failure recorded |
//! | Conflict, Transient | nack + requeue |

use shared_types::{ErrorKind, MatchError};

/// What to do with a delivery once its handler has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Acknowledge, but record the failure for out-of-band remediation.
    AckAndRecord,
    Requeue,
}

impl Disposition {
    #[must_use]
    pub fn for_error(err: &MatchError) -> Self {
        match err.kind() {
            ErrorKind::Conflict | ErrorKind::Transient => Disposition::Requeue,
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Integrity => {
                Disposition::AckAndRecord
            }
        }
    }
}
