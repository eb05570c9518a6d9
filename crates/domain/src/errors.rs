//! Error types used throughout the client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RemoteErrorEntry;

/// Main error type for TradeLink
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum ApiError {
    #[error("No token can be found for this client, a non-empty token is required")]
    NoAuthToken,

    #[error("Invalid app credential: {0}")]
    InvalidAppCredential(String),

    #[error("The env `{0}` is not supported, only [sandbox, production] are supported")]
    UnsupportedEnvironment(String),

    #[error("The auth type `{0}` is not supported, only [OAUTH, AUTHNAUTH] are supported")]
    UnsupportedAuthScheme(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Token expired at {expired_at}")]
    TokenExpired { expired_at: DateTime<Utc> },

    #[error("{operation} failed: {message}")]
    RemoteOperationFailed { operation: String, message: String, errors: Vec<RemoteErrorEntry> },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Page callback failed: {0}")]
    Callback(String),
}

/// Error kinds callers switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    NoAuthToken,
    InvalidAppCredential,
    UnsupportedEnvironment,
    UnsupportedAuthScheme,
    InvalidOptions,
    TokenExpired,
    RemoteOperationFailed,
    UnknownOperation,
    InvalidHeader,
    Transport,
    Decode,
    Config,
    Callback,
}

impl ApiError {
    /// Get the kind of this error
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::NoAuthToken => ApiErrorKind::NoAuthToken,
            Self::InvalidAppCredential(_) => ApiErrorKind::InvalidAppCredential,
            Self::UnsupportedEnvironment(_) => ApiErrorKind::UnsupportedEnvironment,
            Self::UnsupportedAuthScheme(_) => ApiErrorKind::UnsupportedAuthScheme,
            Self::InvalidOptions(_) => ApiErrorKind::InvalidOptions,
            Self::TokenExpired { .. } => ApiErrorKind::TokenExpired,
            Self::RemoteOperationFailed { .. } => ApiErrorKind::RemoteOperationFailed,
            Self::UnknownOperation(_) => ApiErrorKind::UnknownOperation,
            Self::InvalidHeader(_) => ApiErrorKind::InvalidHeader,
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::Config(_) => ApiErrorKind::Config,
            Self::Callback(_) => ApiErrorKind::Callback,
        }
    }

    /// Returns true for errors raised while constructing a client, before any
    /// request could be issued.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::NoAuthToken
                | ApiErrorKind::InvalidAppCredential
                | ApiErrorKind::UnsupportedEnvironment
                | ApiErrorKind::UnsupportedAuthScheme
                | ApiErrorKind::Config
        )
    }

    /// Remote error entries attached to a failed operation, empty otherwise
    pub fn remote_errors(&self) -> &[RemoteErrorEntry] {
        match self {
            Self::RemoteOperationFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Result type alias for TradeLink operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ApiError::NoAuthToken.kind(), ApiErrorKind::NoAuthToken);
        assert_eq!(
            ApiError::UnsupportedEnvironment("staging".into()).kind(),
            ApiErrorKind::UnsupportedEnvironment
        );
        assert_eq!(
            ApiError::TokenExpired { expired_at: Utc::now() }.kind(),
            ApiErrorKind::TokenExpired
        );
        assert_eq!(ApiError::Transport("refused".into()).kind(), ApiErrorKind::Transport);
    }

    #[test]
    fn test_construction_errors() {
        assert!(ApiError::NoAuthToken.is_construction_error());
        assert!(ApiError::UnsupportedAuthScheme("FAKE".into()).is_construction_error());
        assert!(!ApiError::InvalidOptions("x".into()).is_construction_error());
        assert!(!ApiError::Transport("x".into()).is_construction_error());
    }

    #[test]
    fn test_remote_failure_message_and_entries() {
        let err = ApiError::RemoteOperationFailed {
            operation: "GetOrders".into(),
            message: "1,2".into(),
            errors: vec![RemoteErrorEntry::default()],
        };

        assert_eq!(err.to_string(), "GetOrders failed: 1,2");
        assert_eq!(err.remote_errors().len(), 1);
        assert!(ApiError::NoAuthToken.remote_errors().is_empty());
    }

    #[test]
    fn test_unsupported_environment_message_names_input() {
        let err = ApiError::UnsupportedEnvironment("staging".into());
        assert!(err.to_string().contains("staging"));
    }
}
