//! Transport client: how a descriptor reaches a resource that is not
//! defined in this process.
//!
//! [`HttpTransport`] sends the request over HTTP with `reqwest`.
//! [`DetachedTransport`] is used when no remote endpoint is configured and
//! fails every call.

use std::sync::Arc;

use async_trait::async_trait;
use isopropyl_core::{Request, Verb, JSON_CONTENT_TYPE};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::config::TransportConfig;
use crate::error::TransportError;

/// Sends a [`Request`] to a remote peer and returns the decoded body.
///
/// Implementations own query encoding, transmission, status interpretation
/// (non-2xx is an error) and body decoding.
///
/// Used as `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform the remote call described by `request`.
    async fn send(&self, request: Request) -> Result<Value, TransportError>;
}

/// Builds the transport described by `config`.
///
/// # Errors
///
/// Returns [`TransportError::Network`] if the HTTP client cannot be built.
pub fn from_config(config: &TransportConfig) -> Result<Arc<dyn Transport>, TransportError> {
    match &config.base_url {
        Some(base_url) => Ok(Arc::new(HttpTransport::new(base_url, config)?)),
        None => Ok(Arc::new(DetachedTransport)),
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// JSON-over-HTTP transport.
///
/// The request URL is `base_url` followed by the request's derived URI. The
/// query map is encoded onto the URL, and the body is sent as JSON unless it
/// is `null`. An empty response body decodes to `null`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Put => Method::PUT,
        Verb::Post => Method::POST,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        // descriptor URIs arrive with every segment already percent-encoded
        let url = format!("{}{}", self.base_url, request.url);

        let mut builder = self
            .client
            .request(method_for(request.method), &url)
            .header(ACCEPT, JSON_CONTENT_TYPE);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.body.is_null() {
            builder = builder.json(&request.body);
        }

        let response = builder.send().await.map_err(|err| {
            tracing::warn!(%url, error = %err, "transport request failed");
            TransportError::Network(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "transport received non-success status");
            return Err(TransportError::Status { status, url });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(%url, status = status.as_u16(), bytes = bytes.len(), "transport request complete");

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(TransportError::Decode)
    }
}

// ---------------------------------------------------------------------------
// DetachedTransport
// ---------------------------------------------------------------------------

/// Transport for processes with no remote peer.
///
/// Every call fails with [`TransportError::NotConfigured`]. This is the
/// default when [`TransportConfig::base_url`] is unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedTransport;

#[async_trait]
impl Transport for DetachedTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        tracing::debug!(url = %request.url, "no transport configured");
        Err(TransportError::NotConfigured { url: request.url })
    }
}
