use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod config;
mod fetch;
mod scheduler;
mod server;
mod store;

use config::Config;
use fetch::{FetchJobs, UpstreamConfig};
use server::AppState;
use store::SnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    std::fs::create_dir_all(&config.store_dir)
        .with_context(|| format!("Failed to create store directory {}", config.store_dir))?;
    let store = SnapshotStore::new(&config.store_dir);
    info!("Snapshot store directory: {}", config.store_dir);

    let jobs = Arc::new(FetchJobs::new(
        store.clone(),
        UpstreamConfig::from_config(&config),
    )?);

    // Background refresh schedules; each fires once immediately.
    scheduler::start(Arc::clone(&jobs), &config)?;

    let state = AppState { store, jobs };
    let app = server::router(state);
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Scoreboard API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve until shutdown
    axum::serve(listener, app).await?;

    Ok(())
}
