//! Bearer token authentication and the administrator gate.
//!
//! Every locally served operation requires `Authorization: Bearer <jwt>` of a
//! caller in the administrators group. The caller identity used by the
//! delete guard comes from the verified token, never from the request body.

use std::collections::HashMap;

use acct_model::Caller;
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AdminError, AdminResult};

// ============================================================================
// Token Validator Trait
// ============================================================================

/// Validates bearer tokens and extracts the caller.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validates a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` if the token is invalid or expired.
    async fn validate(&self, token: &str) -> AdminResult<Caller>;
}

// ============================================================================
// JWT Validator
// ============================================================================

/// Key used to verify token signatures.
#[derive(Clone)]
pub enum JwtKey {
    /// HS256 shared secret.
    Hs256(String),
    /// RS256 public key in PEM form.
    Rs256(String),
}

impl std::fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hs256(_) => f.write_str("Hs256(..)"),
            Self::Rs256(_) => f.write_str("Rs256(..)"),
        }
    }
}

/// JWT verification settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signature key.
    pub key: JwtKey,
    /// Required `iss`, if any.
    pub issuer: Option<String>,
    /// Required `aud`, if any.
    pub audience: Option<String>,
}

impl JwtConfig {
    /// Creates a config for an HS256 secret with no issuer or audience check.
    #[must_use]
    pub fn hs256(secret: impl Into<String>) -> Self {
        Self {
            key: JwtKey::Hs256(secret.into()),
            issuer: None,
            audience: None,
        }
    }
}

/// Claims read from admin tokens. Unknown claims are ignored.
#[derive(Debug, Deserialize)]
struct AdminClaims {
    #[serde(default)]
    sub: String,
    #[serde(rename = "cognito:username")]
    cognito_username: Option<String>,
    username: Option<String>,
    email: Option<String>,
    #[serde(rename = "cognito:groups", default)]
    groups: Vec<String>,
}

impl AdminClaims {
    fn identity(&self) -> Option<&str> {
        [
            self.cognito_username.as_deref(),
            self.username.as_deref(),
            self.email.as_deref(),
            Some(self.sub.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
    }
}

/// Verifies signed JWTs with `jsonwebtoken`.
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtTokenValidator {
    /// Creates a validator.
    ///
    /// `exp` is always checked. Issuer and audience are checked when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the RS256 key is not a valid PEM public key.
    pub fn new(config: JwtConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let (decoding_key, algorithm) = match &config.key {
            JwtKey::Hs256(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            JwtKey::Rs256(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> AdminResult<Caller> {
        let data = decode::<AdminClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AdminError::Unauthorized
        })?;
        let claims = data.claims;
        let identity = claims.identity().ok_or(AdminError::Unauthorized)?;
        Ok(Caller::new(identity, claims.sub.clone()).with_groups(claims.groups))
    }
}

// ============================================================================
// Static Validator
// ============================================================================

/// Validator backed by a fixed token table, for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenValidator {
    /// Creates an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as `caller`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, caller: Caller) -> Self {
        self.tokens.insert(token.into(), caller);
        self
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> AdminResult<Caller> {
        self.tokens.get(token).cloned().ok_or(AdminError::Unauthorized)
    }
}

// ============================================================================
// Request Authentication
// ============================================================================

/// Authenticates the request and requires an administrator.
///
/// # Errors
///
/// - `Unauthorized` if the bearer token is missing or invalid
/// - `Forbidden` if the caller is not in the administrators group
pub async fn authenticate_admin(
    validator: &dyn TokenValidator,
    headers: &HeaderMap,
) -> AdminResult<Caller> {
    let token = extract_bearer_token(headers).ok_or(AdminError::Unauthorized)?;
    let caller = validator.validate(token).await?;
    if !caller.is_admin() {
        tracing::warn!(caller = %caller.username, "Admin operation refused to non-admin caller");
        return Err(AdminError::Forbidden);
    }
    Ok(caller)
}

/// Extracts the bearer token from the headers.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
