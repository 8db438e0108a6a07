//! # Account Admin Server
//!
//! Main entry point for the admin user lifecycle service.

#![forbid(unsafe_code)]

use acct_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.directory_backend,
        "Account admin service starting"
    );

    let server = Server::new(config).await?;
    server.run().await
}
