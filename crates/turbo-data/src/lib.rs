//! HTTP client utilities for TurboCommerce.
//!
//! Provides an ergonomic async API for calling commerce platform endpoints
//! with automatic JSON handling, per-dependency timeouts and retries, and a
//! cache for short-lived platform credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_data::{DependencyTag, FetchClient};
//!
//! let client = FetchClient::new()
//!     .with_base_url("https://api.bigcommerce.com/stores/abc123")
//!     .with_default_header("X-Auth-Token", token);
//!
//! let promotions: PromotionsPage = client
//!     .get("/v3/promotions")
//!     .tagged(DependencyTag::Promotions)
//!     .fetch_json()
//!     .await?;
//! ```

mod dependency;
mod error;
mod request;
mod response;
mod retry;
mod timeout;
mod token;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use dependency::{DependencyTag, FetchPolicy};
pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;
pub use retry::{RetryPolicy, RATE_LIMITED};
pub use timeout::{millis, TimeoutConfig};
pub use token::{IssuedToken, TokenCache, TokenSource, DEFAULT_REFRESH_MARGIN_SECS};

/// HTTP client for making outbound requests.
///
/// A thin layer over `reqwest` that adds a base URL, default headers, and the
/// timeout/retry policy of the dependency being called.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: BTreeMap<String, String>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Client with the default connect timeout.
    pub fn new() -> Self {
        let connect = TimeoutConfig::default().connect;
        let http = reqwest::Client::builder()
            .connect_timeout(connect)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self::from_reqwest(http)
    }

    /// Wrap an already configured reqwest client.
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: None,
            default_headers: BTreeMap::new(),
        }
    }

    /// Prefix for relative request paths, e.g. a store's API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Header sent on every request, e.g. the store's auth token.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Post, url)
    }

    /// Start a request, untagged until [`ClientRequestBuilder::tagged`].
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        let full_url = self.resolve_url(url.into());

        let mut builder = RequestBuilder::new(method, full_url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            client: self,
            builder,
            tag: DependencyTag::Custom("http"),
            policy: None,
        }
    }

    fn resolve_url(&self, url: String) -> String {
        match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url,
        }
    }
}

/// A request bound to the client that will send it.
pub struct ClientRequestBuilder<'a> {
    client: &'a FetchClient,
    builder: RequestBuilder,
    tag: DependencyTag,
    policy: Option<FetchPolicy>,
}

impl<'a> ClientRequestBuilder<'a> {
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Tag the request with the dependency it calls; selects default policy.
    pub fn tagged(mut self, tag: DependencyTag) -> Self {
        self.tag = tag;
        self
    }

    /// Override the tag's default timeout/retry policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Send the request and return the response.
    ///
    /// Non-2xx responses are returned as `Ok`; use
    /// [`Response::error_for_status`] to turn them into errors.
    pub async fn send(self) -> Result<Response, FetchError> {
        let policy = self
            .policy
            .clone()
            .unwrap_or_else(|| FetchPolicy::from_tag(self.tag));
        let total = policy.timeout.total;
        let mut retry = 0;

        loop {
            let started = Instant::now();
            let request = self.builder.to_reqwest(&self.client.http);
            let outcome = tokio::time::timeout(total, async {
                let resp = request.send().await?;
                Response::read(resp).await
            })
            .await
            .unwrap_or(Err(FetchError::Timeout(total)));

            let delay = match outcome {
                Ok(resp) => match policy.retry.retry_response(&resp, retry) {
                    Some(delay) => {
                        warn!(
                            dependency = %self.tag,
                            status = resp.status,
                            retry,
                            delay_ms = delay.as_millis() as u64,
                            "replaying after error status"
                        );
                        delay
                    }
                    None => {
                        debug!(
                            dependency = %self.tag,
                            method = self.builder.method().as_str(),
                            status = resp.status,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "fetch complete"
                        );
                        return Ok(resp);
                    }
                },
                Err(e) => match policy.retry.retry_error(&e, retry) {
                    Some(delay) => {
                        warn!(dependency = %self.tag, error = %e, retry, "replaying after failure");
                        delay
                    }
                    None => return Err(e),
                },
            };

            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    /// Send, require a 2xx status, and parse the body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        self.send().await?.error_for_status()?.json()
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{DependencyTag, FetchClient, FetchError, Method, Response};
}
