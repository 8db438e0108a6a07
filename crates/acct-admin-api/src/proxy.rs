//! Verbatim request forwarding for remotely served operations.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap,
    },
    response::Response,
};

use crate::dispatch::RemoteEndpoint;
use crate::error::{AdminError, AdminResult};

/// Default request timeout for forwarded calls.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client that relays admin requests to remote endpoints.
///
/// The request body and its `Content-Type` and `Authorization` headers are
/// sent as received. The remote status, `Content-Type` and body come back
/// unchanged. Nothing is parsed on either leg.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
}

impl ProxyClient {
    /// Creates a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Forwards one request and relays the response.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Proxy` if the remote endpoint cannot be reached
    /// or its body cannot be read.
    pub async fn forward(
        &self,
        endpoint: &RemoteEndpoint,
        headers: &HeaderMap,
        body: Bytes,
    ) -> AdminResult<Response> {
        let mut request = self.client.post(endpoint.url().clone()).body(body);
        for name in [CONTENT_TYPE, AUTHORIZATION] {
            if let Some(value) = headers.get(&name) {
                request = request.header(name, value.clone());
            }
        }

        let remote = request.send().await.map_err(|e| {
            tracing::error!(url = %endpoint, error = %e, "Remote endpoint unreachable");
            AdminError::Proxy(e.to_string())
        })?;

        let status = remote.status();
        let content_type = remote.headers().get(CONTENT_TYPE).cloned();
        let bytes = remote.bytes().await.map_err(|e| {
            tracing::error!(url = %endpoint, error = %e, "Failed to read remote response");
            AdminError::Proxy(e.to_string())
        })?;

        tracing::debug!(url = %endpoint, status = %status, "Relayed remote response");

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        if let Some(content_type) = content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        Ok(response)
    }
}
