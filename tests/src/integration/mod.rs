//! # Integration Flows
//!
//! Every test drives a fully wired [`match_runtime::MatchRuntime`]: commands
//! go through the lifecycle engine, inbound events through the bus queue and
//! consumer, and assertions read the store, the cache and the observed
//! outbound events.

#[cfg(test)]
pub(crate) mod fixtures;

pub mod lifecycle_flows;
pub mod propagation_flows;
pub mod resilience;
