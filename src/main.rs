//! Cube Duel Server
//!
//! Accepts WebSocket connections and runs head-to-head cube races.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cube_duel::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env();
    info!("Cube Duel Server v{}", VERSION);
    info!("Max connections: {}", config.max_connections);

    let server = Arc::new(GameServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_server.shutdown(),
            Err(e) => warn!("Failed to listen for ctrl-c: {}", e),
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
