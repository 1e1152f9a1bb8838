//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while reading a byte stream.
///
/// Frame-level problems never show up here: the demuxer logs and drops
/// them, including frames that outgrow the buffer limit. These errors
/// describe the byte source itself.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying byte stream reported a failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StreamError {
    /// Create a transport error from any displayable error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Message reported by the byte source.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) => msg,
        }
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::transport("connection reset");
        assert_eq!(err.to_string(), "Transport error: connection reset");
        assert_eq!(err.message(), "connection reset");
    }
}
