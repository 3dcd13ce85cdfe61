//! # Match Service
//!
//! Tracks tournament matches through their lifecycle and advances bracket
//! winners from events on the tournament exchange.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Install logging (`RUST_LOG`, else `MATCHES_LOG_LEVEL`, else `info`)
//! 3. Wire store, cache, bus, lifecycle engine and propagator
//! 4. Bind `matches_service_queue` and start the consumer
//! 5. Wait for Ctrl-C, then drain and shut down

use anyhow::{Context, Result};
use tracing::info;

use match_runtime::{MatchRuntime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter().context("Invalid log level")?)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let runtime = MatchRuntime::new(config).context("Invalid match service configuration")?;
    runtime.start();
    info!("Match service ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
