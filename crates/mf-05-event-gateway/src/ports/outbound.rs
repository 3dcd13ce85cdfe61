//! # Outbound Ports
//!
//! Where committed state changes are announced.

use async_trait::async_trait;
use shared_types::MatchEvent;

/// Best-effort sink for domain events.
///
/// Called after the store write has committed. Implementations log and
/// swallow their own failures: events are a side channel, not part of the
/// transaction.
#[async_trait]
pub trait MatchEventSink: Send + Sync {
    async fn emit(&self, event: MatchEvent);
}
