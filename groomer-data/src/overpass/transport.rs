//! HTTP transport for Overpass queries.
//!
//! [`OverpassTransport`] performs exactly one round trip and reports what
//! happened without judging it; retry decisions belong to
//! [`ResilientFetcher`](super::ResilientFetcher).
//!
//! [`HttpTransport`] keeps the trait synchronous by blocking on an owned
//! Tokio runtime, so the harvester can drive it from plain sequential code.

use std::time::Duration;

use groomer_core::OverpassQuery;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::Endpoint;

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "groomer-harvest/0.1";

/// Default client-side timeout. Overpass responses can be large and slow.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Raw HTTP reply from a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpReply {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that prevented any HTTP reply from being received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Mirror URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// Connection or protocol failure.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Mirror URL.
        url: String,
        /// Error text from the HTTP client.
        message: String,
    },
}

/// One request/response exchange with an Overpass mirror.
pub trait OverpassTransport {
    /// POST `query` to `endpoint` and return the reply, whatever its status.
    fn post(&self, endpoint: &Endpoint, query: &OverpassQuery) -> Result<HttpReply, TransportError>;
}

impl<T: OverpassTransport + ?Sized> OverpassTransport for &T {
    fn post(&self, endpoint: &Endpoint, query: &OverpassQuery) -> Result<HttpReply, TransportError> {
        (**self).post(endpoint, query)
    }
}

/// Errors raised while constructing an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Whole-request timeout, covering connect and body download.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// `reqwest`-backed transport posting form-encoded queries.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(TransportBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    async fn post_async(
        &self,
        endpoint: &Endpoint,
        query: &OverpassQuery,
    ) -> Result<HttpReply, TransportError> {
        let url = endpoint.as_str();
        let response = self
            .client
            .post(url)
            .form(&[("data", query.as_ref())])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        Ok(HttpReply { status, body })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        TransportError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl OverpassTransport for HttpTransport {
    fn post(&self, endpoint: &Endpoint, query: &OverpassQuery) -> Result<HttpReply, TransportError> {
        // block_in_place needs a multi-threaded runtime; anything else falls
        // back to the transport's own runtime.
        let future = self.post_async(endpoint, query);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
