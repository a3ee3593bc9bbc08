//! Request/response seam between discovery and the network.
//!
//! Discovery only ever sees [`Transport`]: one call that either returns a
//! decoded success response or a [`TransportFailure`]. [`ReqwestTransport`]
//! is the production implementation; tests supply scripted transports.

use crate::{DiscordConfig, DiscordError, DiscordErrorKind, DiscordResult};
use async_trait::async_trait;
use guildscout_error::{GuildscoutResult, HttpError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, instrument};

/// An outgoing API call.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL including query string.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// `GET url` authorized with `token`.
    ///
    /// The token is sent verbatim in the `Authorization` header, so it must
    /// carry its scheme (`Bot ...` or `Bearer ...`).
    pub fn get(url: impl Into<String>, token: &str) -> DiscordResult<Self> {
        let mut authorization = HeaderValue::from_str(token).map_err(|_| {
            DiscordError::new(DiscordErrorKind::ConfigurationError(
                "Token contains characters not allowed in a header".to_string(),
            ))
        })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        Ok(Self {
            method: Method::GET,
            url: url.into(),
            headers,
        })
    }

    /// The `Authorization` header value, if readable.
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION)?.to_str().ok()
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded JSON body.
    pub body: Value,
}

/// Why a call did not produce an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum TransportFailure {
    /// The server answered with a non-success status.
    #[display("HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response headers.
        headers: HeaderMap,
        /// Raw response body.
        body: String,
    },
    /// Connection, timeout or I/O failure.
    #[display("network failure: {_0}")]
    Network(String),
    /// The body could not be decoded into the expected shape.
    #[display("malformed body: {_0}")]
    Malformed(String),
}

/// One request/response primitive.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` and return the decoded success response.
    async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, TransportFailure>;
}

/// Transport backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the configured user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &DiscordConfig) -> GuildscoutResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, TransportFailure> {
        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;
        debug!(status = status.as_u16(), len = bytes.len(), "Received response");

        if !status.is_success() {
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                headers,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body = serde_json::from_slice(&bytes)
            .map_err(|e| TransportFailure::Malformed(e.to_string()))?;

        Ok(ApiResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
