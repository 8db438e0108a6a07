//! Server configuration.
//!
//! Configuration is loaded from `ACCT_*` environment variables with sensible
//! defaults. A `.env` file is read first if present.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use acct_admin_api::{DispatchError, DispatchTable, JwtConfig, JwtKey, Operation};
use acct_directory::cognito::MAX_PAGE_SIZE;
use acct_directory::CognitoConfig;
use acct_lifecycle::{LifecycleConfig, DEFAULT_LIST_LIMIT};
use anyhow::{anyhow, bail};

/// Directory implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryBackend {
    /// Amazon Cognito user pool.
    Cognito,
    /// In-process directory, for development.
    Memory,
}

impl DirectoryBackend {
    /// Returns the configuration name of the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cognito => "cognito",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for DirectoryBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cognito" => Ok(Self::Cognito),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown directory backend '{other}'")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Directory implementation.
    pub directory_backend: DirectoryBackend,

    /// Cognito user pool id (required for the Cognito backend).
    pub user_pool_id: Option<String>,

    /// Cognito region; SDK default chain when absent.
    pub aws_region: Option<String>,

    /// Cognito endpoint override.
    pub directory_endpoint: Option<String>,

    /// SDK operation timeout.
    pub directory_timeout: Duration,

    /// Upper bound on any single directory call made by the lifecycle layer.
    pub call_timeout: Duration,

    /// List page size.
    pub list_limit: usize,

    /// Concurrent group lookups while listing.
    pub enrichment_concurrency: usize,

    /// HS256 secret for bearer tokens.
    pub jwt_secret: Option<String>,

    /// RS256 public key (PEM) for bearer tokens.
    pub jwt_public_key_pem: Option<String>,

    /// Required token issuer.
    pub jwt_issuer: Option<String>,

    /// Required token audience.
    pub jwt_audience: Option<String>,

    /// Remote endpoint per forwarded operation.
    pub remote_urls: HashMap<Operation, String>,

    /// Timeout for forwarded requests.
    pub proxy_timeout: Duration,

    /// Request body limit in bytes.
    pub max_body_bytes: usize,

    /// CORS allowed origins (comma-separated).
    pub cors_origins: Vec<String>,

    /// Log level.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable values or missing required settings.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable values or missing required settings.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("ACCT_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&get, "ACCT_PORT", 8080)?;

        let directory_backend = parse_or(&get, "ACCT_DIRECTORY_BACKEND", DirectoryBackend::Cognito)?;
        let user_pool_id = get("ACCT_USER_POOL_ID");
        let aws_region = get("ACCT_AWS_REGION");
        let directory_endpoint = get("ACCT_DIRECTORY_ENDPOINT");
        let directory_timeout = millis_or(&get, "ACCT_DIRECTORY_TIMEOUT_MS", 5_000)?;
        let call_timeout = millis_or(&get, "ACCT_CALL_TIMEOUT_MS", 8_000)?;

        let list_limit = parse_or(&get, "ACCT_LIST_LIMIT", DEFAULT_LIST_LIMIT)?;
        let enrichment_concurrency = parse_or(&get, "ACCT_ENRICHMENT_CONCURRENCY", 8)?;

        let jwt_secret = get("ACCT_JWT_SECRET");
        let jwt_public_key_pem = get("ACCT_JWT_PUBLIC_KEY_PEM");
        let jwt_issuer = get("ACCT_JWT_ISSUER");
        let jwt_audience = get("ACCT_JWT_AUDIENCE");

        let remote_urls = Operation::ALL
            .into_iter()
            .filter_map(|op| {
                get(&format!("ACCT_REMOTE_{}_URL", op.config_key())).map(|url| (op, url))
            })
            .collect();
        let proxy_timeout = millis_or(&get, "ACCT_PROXY_TIMEOUT_MS", 10_000)?;
        let max_body_bytes = parse_or(&get, "ACCT_MAX_BODY_BYTES", 16 * 1024)?;

        let cors_origins = get("ACCT_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let log_level = get("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let config = Self {
            host,
            port,
            directory_backend,
            user_pool_id,
            aws_region,
            directory_endpoint,
            directory_timeout,
            call_timeout,
            list_limit,
            enrichment_concurrency,
            jwt_secret,
            jwt_public_key_pem,
            jwt_issuer,
            jwt_audience,
            remote_urls,
            proxy_timeout,
            max_body_bytes,
            cors_origins,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration for testing: in-memory directory, HS256
    /// tokens signed with `jwt_secret`, random port.
    #[must_use]
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            directory_backend: DirectoryBackend::Memory,
            jwt_secret: Some(jwt_secret.to_string()),
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.list_limit) {
            bail!("ACCT_LIST_LIMIT must be between 1 and {MAX_PAGE_SIZE}");
        }
        if self.enrichment_concurrency == 0 {
            bail!("ACCT_ENRICHMENT_CONCURRENCY must be at least 1");
        }
        if self.max_body_bytes == 0 {
            bail!("ACCT_MAX_BODY_BYTES must be at least 1");
        }
        if self.directory_backend == DirectoryBackend::Cognito && self.user_pool_id.is_none() {
            bail!("ACCT_USER_POOL_ID is required for the cognito directory backend");
        }
        match (&self.jwt_secret, &self.jwt_public_key_pem) {
            (Some(_), Some(_)) => {
                bail!("set only one of ACCT_JWT_SECRET and ACCT_JWT_PUBLIC_KEY_PEM")
            }
            (None, None) => bail!("ACCT_JWT_SECRET or ACCT_JWT_PUBLIC_KEY_PEM is required"),
            _ => {}
        }
        self.dispatch_table()?;
        Ok(())
    }

    /// Returns the bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the token verification settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no verification key is configured.
    pub fn jwt_config(&self) -> anyhow::Result<JwtConfig> {
        let key = match (&self.jwt_secret, &self.jwt_public_key_pem) {
            (Some(secret), _) => JwtKey::Hs256(secret.clone()),
            (None, Some(pem)) => JwtKey::Rs256(pem.replace("\\n", "\n")),
            (None, None) => bail!("no JWT verification key configured"),
        };
        Ok(JwtConfig {
            key,
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
        })
    }

    /// Returns the Cognito adapter settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no user pool id is configured.
    pub fn cognito_config(&self) -> anyhow::Result<CognitoConfig> {
        let pool = self
            .user_pool_id
            .as_deref()
            .ok_or_else(|| anyhow!("ACCT_USER_POOL_ID is not set"))?;
        Ok(CognitoConfig {
            region: self.aws_region.clone(),
            endpoint_url: self.directory_endpoint.clone(),
            timeout: self.directory_timeout,
            ..CognitoConfig::new(pool)
        })
    }

    /// Returns the lifecycle settings.
    #[must_use]
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            list_limit: self.list_limit,
            enrichment_concurrency: self.enrichment_concurrency,
            call_timeout: self.call_timeout,
        }
    }

    /// Resolves the per-operation dispatch strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote URL is malformed.
    pub fn dispatch_table(&self) -> Result<DispatchTable, DispatchError> {
        DispatchTable::from_lookup(|op| self.remote_urls.get(&op).cloned())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            directory_backend: DirectoryBackend::Cognito,
            user_pool_id: None,
            aws_region: None,
            directory_endpoint: None,
            directory_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(8),
            list_limit: DEFAULT_LIST_LIMIT,
            enrichment_concurrency: 8,
            jwt_secret: None,
            jwt_public_key_pem: None,
            jwt_issuer: None,
            jwt_audience: None,
            remote_urls: HashMap::new(),
            proxy_timeout: Duration::from_secs(10),
            max_body_bytes: 16 * 1024,
            cors_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("invalid value for {key} ('{raw}'): {e}")),
        None => Ok(default),
    }
}

fn millis_or<G>(get: &G, key: &str, default: u64) -> anyhow::Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let millis = parse_or(get, key, default)?;
    if millis == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_millis(millis))
}
