//! Lens Daemon - persona platform backend.
//!
//! Loads configuration, opens the persona store, and serves the HTTP API.

use anyhow::Result;
use lens_common::LensConfig;
use lensd::server::{self, AppState};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Lens Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("LENS_CONFIG").ok().map(PathBuf::from);
    let config = LensConfig::load(config_path.as_deref());

    if config.inference.to_inference_config().api_key.is_empty() {
        warn!("  No inference API key configured; extraction, chat, and scoring will fail over");
    }

    let state = AppState::new(config)?;
    info!("  Store ready at {:?}", state.config.storage.resolved_db_path());

    server::run(state).await
}
