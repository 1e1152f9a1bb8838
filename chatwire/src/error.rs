//! Dispatch errors.

use chatwire_core::{ChatwireError, TransportError};
use chatwire_dialects::DialectError;
use thiserror::Error;

/// Errors that prevent a stream from being dispatched at all.
///
/// Once bytes flow, every failure becomes an
/// [`EndReason`](chatwire_core::EndReason) on the outcome instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The endpoint could not be reached or answered with a failure status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The dialect is unknown or not compiled in.
    #[error(transparent)]
    Dialect(#[from] DialectError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cancelled before the stream opened.
    #[error("Dispatch cancelled before the stream opened")]
    Cancelled,
}

impl DispatchError {
    /// Check if retrying the request may help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.status_code.is_none() || e.is_rate_limit() || e.is_server_error()
            }
            _ => false,
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

impl From<DispatchError> for ChatwireError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Transport(e) => ChatwireError::Transport(e),
            DispatchError::Dialect(e) => e.into(),
            DispatchError::Configuration(msg) => ChatwireError::Configuration(msg),
            cancelled @ DispatchError::Cancelled => ChatwireError::Internal(cancelled.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(DispatchError::from(TransportError::status(429, "slow down")).is_retryable());
        assert!(DispatchError::from(TransportError::status(503, "")).is_retryable());
        assert!(DispatchError::from(TransportError::connection("reset")).is_retryable());
        assert!(!DispatchError::from(TransportError::status(401, "bad key")).is_retryable());
        assert!(!DispatchError::Cancelled.is_retryable());
    }

    #[test]
    fn test_into_chatwire_error() {
        let err: ChatwireError = DispatchError::Configuration("bad".into()).into();
        assert!(matches!(err, ChatwireError::Configuration(_)));
    }
}
