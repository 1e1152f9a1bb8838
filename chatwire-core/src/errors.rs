//! Error types for chatwire.
//!
//! Only failures that happen before a stream starts, or that a caller asks
//! about explicitly, surface as errors. Problems inside a running stream are
//! reported through [`EndReason`](crate::EndReason) instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for chatwire operations.
#[derive(Error, Debug)]
pub enum ChatwireError {
    /// The upstream endpoint refused or failed the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A dialect produced actions the transmitter cannot accept.
    #[error(transparent)]
    InvalidSequence(#[from] InvalidActionSequence),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using ChatwireError.
pub type Result<T> = std::result::Result<T, ChatwireError>;

/// Pre-stream transport failure (non-success status or connection error).
#[derive(Error, Debug, Clone)]
pub struct TransportError {
    /// HTTP status code, if a response was received.
    pub status_code: Option<u16>,
    /// Response body, possibly truncated.
    pub body: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Error message.
    pub message: Option<String>,
    /// Retry-after header value in seconds.
    pub retry_after: Option<u64>,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "Transport error (status {})", status)?,
            None => write!(f, "Transport error")?,
        }
        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

impl TransportError {
    /// Create an error for a non-success HTTP response.
    pub fn status(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            body: body.into(),
            headers: HashMap::new(),
            message: None,
            retry_after: None,
        }
    }

    /// Create an error for a failed connection (no response at all).
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            body: String::new(),
            headers: HashMap::new(),
            message: Some(message.into()),
            retry_after: None,
        }
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        if let Some(retry_after) = self.headers.get("retry-after") {
            self.retry_after = retry_after.parse().ok();
        }
        self
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.status_code == Some(429)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status_code.is_some_and(|s| s >= 500)
    }
}

/// A canonical action arrived that the current transmitter state rejects.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidActionSequence {
    /// Description of the rejected action.
    pub message: String,
    /// The call id the action referenced, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl fmt::Display for InvalidActionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid action sequence: {}", self.message)?;
        if let Some(ref id) = self.call_id {
            write!(f, " (call_id: {})", id)?;
        }
        Ok(())
    }
}

impl InvalidActionSequence {
    /// Create a new sequence error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            call_id: None,
        }
    }

    /// Set the referenced call id.
    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.call_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_rate_limit() {
        let err = TransportError::status(429, "slow down");
        assert!(err.is_rate_limit());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_transport_error_retry_after() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "12".to_string());
        let err = TransportError::status(503, "").with_headers(headers);
        assert!(err.is_server_error());
        assert_eq!(err.retry_after, Some(12));
    }

    #[test]
    fn test_connection_error_display() {
        let err = TransportError::connection("refused");
        assert_eq!(err.to_string(), "Transport error: refused");
    }

    #[test]
    fn test_invalid_sequence_display() {
        let err = InvalidActionSequence::new("no open function call").with_call_id("call_9");
        let wrapped: ChatwireError = err.into();
        assert!(wrapped.to_string().contains("call_9"));
    }
}
