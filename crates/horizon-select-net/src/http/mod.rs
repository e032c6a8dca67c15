//! HTTP client for Horizon Select remote sources.
//!
//! # Example
//!
//! ```ignore
//! use horizon_select_net::http::{HttpClient, HttpMethod};
//!
//! // Create a client with default settings
//! let client = HttpClient::new();
//!
//! // GET: parameters travel in the query string
//! let response = client
//!     .get("https://api.example.com/users")
//!     .query("term", "jo")
//!     .send()
//!     .await?;
//!
//! // POST: parameters travel in a form body
//! let response = client
//!     .post("https://api.example.com/users/search")
//!     .form_pairs([("term".to_string(), "jo".to_string())])
//!     .send()
//!     .await?;
//! ```

mod cancel;
mod client;
mod request;
mod response;

pub use cancel::{cancellation_pair, Cancellation, RequestHandle, RequestId};
pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::{HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody};
pub use response::HttpResponse;
