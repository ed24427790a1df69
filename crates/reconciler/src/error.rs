//! Error types for the reconciler crate.

use std::fmt;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Clone)]
pub enum Error {
    /// Subscribing to the event feed failed.
    SubscribeFailed { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscribeFailed { reason } => {
                write!(f, "event subscription failed: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a subscribe failed error.
    pub fn subscribe_failed(reason: impl Into<String>) -> Self {
        Self::SubscribeFailed {
            reason: reason.into(),
        }
    }
}
