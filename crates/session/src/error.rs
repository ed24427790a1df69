//! Error types for the session crate.

use thiserror::Error;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the chat platform.
#[derive(Error, Debug)]
pub enum Error {
    /// Login was rejected or could not be completed.
    #[error("login failed: {reason}")]
    LoginFailed { reason: String },

    /// A session operation could not be completed.
    #[error("{operation} failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    /// The gateway answered with a non-success status.
    #[error("{operation} returned {status}: {body}")]
    UnexpectedStatus {
        operation: String,
        status: u16,
        body: String,
    },

    /// Subscribing to the event feed failed.
    #[error("subscription failed: {reason}")]
    SubscriptionFailed { reason: String },

    /// An event on the feed could not be decoded.
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    /// Configuration error.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Create a login failed error.
    pub fn login_failed(reason: impl Into<String>) -> Self {
        Self::LoginFailed {
            reason: reason.into(),
        }
    }

    /// Create a request failed error.
    pub fn request_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an unexpected status error.
    pub fn unexpected_status(
        operation: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::UnexpectedStatus {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a subscription failed error.
    pub fn subscription_failed(reason: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid event error.
    pub fn invalid_event(reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }
}
