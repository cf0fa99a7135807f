//! Buraco client binary.
//!
//! Opens (or creates) a game session and logs its state until Ctrl-C or until
//! the real-time channel fails. All settings come from `BURACO_*` environment
//! variables, optionally loaded from `.env`.
//!
//! ```bash
//! # Create a four-bot table and watch it play itself
//! cargo run -p buraco-client
//!
//! # Join an existing game
//! BURACO_GAME_ID=abc BURACO_PLAYER_NAME=Ana cargo run -p buraco-client
//! ```

use anyhow::Result;
use buraco_client::{StopReason, logging, runner};
use client_bootstrap::{ClientBuilder, ClientConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    // 1. Load configuration from environment
    let config = ClientConfig::from_env();

    // 2. Setup logging
    let _log_guard = logging::setup_logging(&config)?;

    tracing::info!(api = %config.api_url, ws = %config.ws_url, "Starting Buraco client");
    tracing::info!("Auto-start: {}", config.session.auto_start);

    // 3. Assemble transports and session factory
    let setup = ClientBuilder::new(config).build()?;

    // 4. Run until Ctrl-C or channel failure
    let report = runner::run(setup, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    tracing::info!(
        session = %report.session,
        snapshots = report.snapshots,
        "Client shutdown complete"
    );

    match report.stop {
        StopReason::Interrupted => Ok(()),
        StopReason::ChannelFailed(err) => Err(err.into()),
    }
}
