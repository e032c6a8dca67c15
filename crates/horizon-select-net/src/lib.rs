//! Networking module for Horizon Select.
//!
//! This crate provides the HTTP plumbing behind remote data sources:
//!
//! - **HTTP Client**: A pooled client with timeouts and default headers
//! - **Request Builder**: Query-string and body serialization per method
//! - **Cancellation**: Abortable in-flight requests via [`RequestHandle`]
//!
//! # HTTP Client
//!
//! ```ignore
//! use horizon_select_net::http::HttpClient;
//!
//! // Create a client
//! let client = HttpClient::new();
//!
//! // Make a request
//! let response = client.get("https://api.example.com/countries")
//!     .query("term", "fra")
//!     .query("page", "1")
//!     .send()
//!     .await?;
//!
//! // Read the response
//! let data: serde_json::Value = response.json()?;
//! ```
//!
//! # Cancellation
//!
//! ```ignore
//! use horizon_select_net::http::{cancellation_pair, HttpClient};
//!
//! let client = HttpClient::new();
//! let (handle, cancellation) = cancellation_pair();
//!
//! let request = client.get("https://api.example.com/slow").send();
//! let pending = tokio::spawn(cancellation.run(request));
//!
//! // Abort the request; `pending` resolves to `Err(NetworkError::Cancelled)`
//! handle.cancel();
//! ```

mod error;
pub mod http;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use http::{
    cancellation_pair, Cancellation, HttpClient, HttpClientBuilder, HttpClientConfig, HttpMethod,
    HttpRequest, HttpRequestBuilder, HttpResponse, RequestBody, RequestHandle, RequestId,
};
