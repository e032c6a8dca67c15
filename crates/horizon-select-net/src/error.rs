//! Errors raised while fetching remote pages.

use thiserror::Error;

/// Why a request produced no usable payload.
///
/// `Cancelled` is not a failure: it means a newer request took the slot of
/// this one. Everything else is reported to the widget as an ajax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The configured URL does not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}{}", detail(.message))]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Response body, when the server sent one.
        message: Option<String>,
    },

    /// The body is not the expected JSON.
    #[error("malformed JSON: {0}")]
    Json(String),

    /// Superseded by a newer request.
    #[error("request cancelled")]
    Cancelled,
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl NetworkError {
    /// Whether the request was abandoned rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// Result alias for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
