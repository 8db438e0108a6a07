//! # acct-server
//!
//! Axum server for the admin user lifecycle service.
//!
//! Assembles the directory adapter, the lifecycle service, token validation
//! and the dispatch table into one router, then serves it until a shutdown
//! signal arrives.
//!
//! ## Usage
//!
//! ```ignore
//! use acct_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;

pub use config::{DirectoryBackend, ServerConfig};
pub use router::create_router;

use std::sync::Arc;

use acct_admin_api::{AdminState, Dispatch, JwtTokenValidator, Operation, ProxyClient};
use acct_directory::{CognitoDirectory, DirectoryProvider, InMemoryDirectory};
use acct_lifecycle::AccountLifecycle;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// The admin lifecycle server.
pub struct Server {
    config: ServerConfig,
    directory: Arc<dyn DirectoryProvider>,
    shutdown: CancellationToken,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// This validates the configuration and connects the configured directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the directory
    /// client cannot be built.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let directory: Arc<dyn DirectoryProvider> = match config.directory_backend {
            DirectoryBackend::Cognito => {
                Arc::new(CognitoDirectory::connect(&config.cognito_config()?).await?)
            }
            DirectoryBackend::Memory => {
                tracing::warn!("Using the in-memory directory; accounts are not persisted");
                Arc::new(InMemoryDirectory::new())
            }
        };

        Ok(Self::with_directory(config, directory))
    }

    /// Creates a server over an existing directory.
    #[must_use]
    pub fn with_directory(config: ServerConfig, directory: Arc<dyn DirectoryProvider>) -> Self {
        Self {
            config,
            directory,
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the root cancellation token. Cancelling it stops the server
    /// and every in-flight operation.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Builds the admin API state.
    ///
    /// # Errors
    ///
    /// Returns an error if the token key, the proxy client or a remote URL
    /// is invalid.
    pub fn state(&self) -> anyhow::Result<AdminState> {
        let lifecycle = AccountLifecycle::new(self.directory.clone(), self.config.lifecycle_config());
        let validator = JwtTokenValidator::new(self.config.jwt_config()?)?;
        let proxy = ProxyClient::new(self.config.proxy_timeout)?;
        let dispatch = self.config.dispatch_table()?;

        for operation in Operation::ALL {
            if let Dispatch::Remote(endpoint) = dispatch.get(operation) {
                tracing::info!(operation = %operation, url = %endpoint, "Operation forwarded to remote endpoint");
            }
        }

        Ok(AdminState::new(Arc::new(lifecycle), Arc::new(validator), proxy)
            .with_dispatch(dispatch)
            .with_shutdown(self.shutdown.clone()))
    }

    /// Creates the router without starting the server.
    ///
    /// # Errors
    ///
    /// See [`Server::state`].
    pub fn router(&self) -> anyhow::Result<Router> {
        Ok(create_router(&self.config, self.state()?))
    }

    /// Runs the server.
    ///
    /// Binds the configured address and blocks until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;

        let token = self.shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            token.cancel();
        });

        self.serve(listener).await
    }

    /// Serves on an already bound listener until the root token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the router cannot be built or serving fails.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr = listener.local_addr()?;

        tracing::info!("Server listening on http://{}", addr);

        let token = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
