//! Error types for the selection engine.

use horizon_select_net::NetworkError;
use thiserror::Error;

/// Errors raised by the selection engine.
///
/// Expected outcomes such as a full selection, a duplicate pick or a
/// superseded response are not errors; they are reported through return
/// values and [`SelectEvent`](crate::SelectEvent)s instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    /// Invalid configuration, detected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An entry could not be turned into an item.
    #[error("cannot normalize entry: {0}")]
    Normalize(String),

    /// Transport failure while talking to a remote source.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// A configuration document or response payload failed to parse.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for SelectError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for SelectError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for selection engine operations.
pub type Result<T> = std::result::Result<T, SelectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SelectError::Config("ajax.url is required".into());
        assert_eq!(err.to_string(), "invalid configuration: ajax.url is required");

        let err: SelectError = NetworkError::Timeout.into();
        assert_eq!(err.to_string(), "network error: request timed out");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(SelectError::from(err), SelectError::Parse(_)));
    }
}
