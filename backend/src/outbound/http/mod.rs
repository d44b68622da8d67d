//! Reqwest clients for the synchronous calls between services.
//!
//! Clients own transport details only: URLs, headers, timeouts, retries,
//! and status/JSON mapping onto the port errors. The current request's
//! trace id is forwarded so one checkout can be followed across services.

mod auth_client;
mod cart_client;
mod catalog_client;
mod order_client;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::domain::{RetryPolicy, Sleeper, TRACE_ID_HEADER, TokioSleeper, TraceId};

pub use auth_client::HttpAuthClient;
pub use cart_client::HttpCartClient;
pub use catalog_client::HttpCatalogClient;
pub use order_client::HttpOrderClient;

/// Errors raised while configuring a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    /// The base URL is not an absolute HTTP URL.
    #[error("invalid base URL {url:?}: {message}")]
    InvalidBaseUrl {
        /// Rejected value.
        url: String,
        /// Parser message.
        message: String,
    },
    /// Reqwest rejected the client settings.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Connection settings shared by every client.
#[derive(Clone)]
pub struct ServiceEndpoint {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ServiceEndpoint {
    /// Endpoint for `base_url` with a per-request `timeout` and no retries.
    ///
    /// # Errors
    /// Returns [`ClientConfigError`] for a malformed URL or when the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientConfigError> {
        let parsed = Url::parse(base_url).map_err(|err| ClientConfigError::InvalidBaseUrl {
            url: base_url.to_owned(),
            message: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientConfigError::InvalidBaseUrl {
                url: base_url.to_owned(),
                message: "scheme must be http or https".to_owned(),
            });
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            retry: RetryPolicy::single_attempt(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Retry transient failures according to `retry`.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the sleeper used between retries.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        with_trace_id(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        with_trace_id(self.client.post(self.url(path)))
    }
}

fn with_trace_id(builder: RequestBuilder) -> RequestBuilder {
    match TraceId::current() {
        Some(trace_id) => builder.header(TRACE_ID_HEADER, trace_id.to_string()),
        None => builder,
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Human-readable message from an error response of another service.
///
/// Understands the `{"message": …}` envelope and a bare `{"error": …}`,
/// falling back to the status reason phrase.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_owned()
        })
}
