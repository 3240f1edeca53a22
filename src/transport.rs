//! Asynchronous transport boundary to the chat service API.
//!
//! Actions describe what to send as an [`ApiRequest`]; a [`Transport`] turns
//! that into a decoded, key-addressable JSON body or a transport-level error.
//! The production implementation is [`HttpTransport`] on `reqwest`; tests
//! substitute their own implementations of the trait.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST with a JSON body.
    Post,
}

/// Descriptor of one outbound request to the chat service.
///
/// Deliberately inert: building one has no side effects, so an action can
/// hand the same descriptor to the executor once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL of the endpoint.
    pub url: String,
    /// JSON body sent with [`Method::Post`] requests.
    pub body: serde_json::Value,
}

impl ApiRequest {
    /// A GET request with no body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: serde_json::Value::Null,
        }
    }

    /// A POST request carrying the given JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body,
        }
    }
}

/// Errors raised below the response-interpretation layer.
///
/// These mean the chat service never gave us a decodable answer; whether an
/// answer made sense is the action's business, not the transport's.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request failed or the body was not decodable JSON.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("chat service returned status {status}")]
    Status {
        /// The HTTP status code received.
        status: u16,
    },
}

/// Asynchronous request/response capability against the chat service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and decode the response body as JSON.
    async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, TransportError>;
}

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for normal operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Production [`Transport`] over a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given timeouts.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self { client }
    }

    /// Create a transport with the default timeouts (5s connect, 30s request).
    pub fn with_default_timeouts() -> Self {
        Self::new(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::with_default_timeouts()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, TransportError> {
        debug!(method = ?request.method, url = %request.url, "sending chat API request");

        let response = match request.method {
            Method::Get => self.client.get(&request.url).send().await?,
            Method::Post => {
                self.client
                    .post(&request.url)
                    .json(&request.body)
                    .send()
                    .await?
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response.text().await.unwrap_or_default();
            warn!(status, "chat API request failed: {body_text}");
            return Err(TransportError::Status { status });
        }

        Ok(response.json().await?)
    }
}
