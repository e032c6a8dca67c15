//! A fully read HTTP response.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{NetworkError, Result};

/// Status, final URL and body of a completed request.
///
/// The body is read as part of sending, so a cancelled request never
/// leaves a half-read response behind.
#[derive(Debug)]
pub struct HttpResponse {
    status: http::StatusCode,
    url: url::Url,
    body: Bytes,
}

impl HttpResponse {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?;
        Ok(Self { status, url, body })
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// URL after redirects.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Fail on a non-2xx status, carrying the body as the error message.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = String::from_utf8_lossy(&self.body).trim().to_string();
        Err(NetworkError::HttpStatus {
            status: self.status(),
            message: (!message.is_empty()).then_some(message),
        })
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
