//! The pooled client behind the built-in remote transport.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use super::request::{HttpMethod, HttpRequestBuilder};
use crate::error::Result;

/// Settings shared by every request a client sends.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Whole-request timeout. A per-request timeout overrides it.
    pub timeout: Option<Duration>,
    /// Follow redirects with reqwest's default limit.
    pub follow_redirects: bool,
    /// `User-Agent` sent with each request.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            follow_redirects: true,
            user_agent: Some(format!("HorizonSelect/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    default_headers: HeaderMap,
}

impl HttpClientBuilder {
    /// Start from the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every request by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Treat redirects as final responses.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Replace the `User-Agent`.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Send `name: value` with every request, e.g. an API key.
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let redirect = if self.config.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };
        let mut builder = reqwest::Client::builder()
            .redirect(redirect)
            .default_headers(self.default_headers);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &self.config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(HttpClient {
            client: builder.build()?,
            config: Arc::new(self.config),
        })
    }
}

/// A cheaply cloneable HTTP client; clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// A client with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised; use
    /// [`HttpClient::builder`] to handle that case.
    pub fn new() -> Self {
        HttpClientBuilder::new()
            .build()
            .expect("Failed to create HTTP client with default configuration")
    }

    /// Configure a new client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// The client's settings.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Start a GET request.
    pub fn get(&self, url: impl AsRef<str>) -> HttpRequestBuilder {
        self.request(HttpMethod::Get, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: impl AsRef<str>) -> HttpRequestBuilder {
        self.request(HttpMethod::Post, url)
    }

    /// Start a request with `method`.
    pub fn request(&self, method: HttpMethod, url: impl AsRef<str>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(self.clone(), method, url.as_ref().to_string())
    }

    pub(crate) fn reqwest_client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
