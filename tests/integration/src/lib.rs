//! Test environment for the end-to-end suite.
//!
//! Each [`TestEnv`] runs a real server on an ephemeral port over an
//! in-memory directory that the test can seed and inspect.

use std::sync::Arc;
use std::time::Duration;

use acct_directory::InMemoryDirectory;
use acct_model::{Account, ATTR_EMAIL};
use acct_server::{Server, ServerConfig};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Shared HS256 secret for every test server.
pub const JWT_SECRET: &str = "integration-secret";

/// A running server plus the handles a test needs.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client for testing.
    pub client: Client,
    /// Directory backing the server.
    pub directory: Arc<InMemoryDirectory>,
    shutdown: CancellationToken,
}

impl TestEnv {
    /// Starts a server with the testing configuration.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(ServerConfig::for_testing(JWT_SECRET)).await
    }

    /// Starts a server with `config`.
    pub async fn with_config(config: ServerConfig) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("acct_server=debug,acct_admin_api=debug,acct_lifecycle=debug")
            .try_init();

        config.validate()?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let directory = Arc::new(InMemoryDirectory::new());
        let server = Server::with_directory(config, directory.clone());
        let shutdown = server.shutdown_token();

        tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                tracing::error!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            directory,
            shutdown,
        })
    }

    /// Returns the absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seeds an account with an email attribute and `groups`.
    pub fn seed(&self, username: &str, groups: &[&str]) {
        let mut account = Account::new(username).with_attribute(ATTR_EMAIL, username);
        account.groups = groups.iter().map(|g| (*g).to_string()).collect();
        self.directory.insert(account);
    }

    /// Posts a JSON body and returns the status and decoded body.
    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json().await?;
        Ok((status, body))
    }

    /// Stops the server.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Mints an HS256 token the way the identity provider would.
pub fn mint_token(username: &str, groups: &[&str]) -> String {
    let claims = json!({
        "sub": format!("sub-{username}"),
        "cognito:username": username,
        "email": username,
        "cognito:groups": groups,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

/// Waits for the server to be ready.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{}/health", base_url);
    let max_attempts = 50;

    for attempt in 1..=max_attempts {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server ready after {} attempts", attempt);
                return Ok(());
            }
            Ok(response) => {
                tracing::debug!(
                    "Server not ready (status {}), attempt {}/{}",
                    response.status(),
                    attempt,
                    max_attempts
                );
            }
            Err(e) => {
                tracing::debug!("Server not ready ({}), attempt {}/{}", e, attempt, max_attempts);
            }
        }
        sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("Server did not become ready in time")
}
