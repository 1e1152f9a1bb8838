//! Dialect lookup errors.
//!
//! Parsing problems inside a stream are never errors here: parsers report
//! them as issue actions so content already committed survives.

use thiserror::Error;

/// Errors raised while selecting a dialect.
#[derive(Debug, Error)]
pub enum DialectError {
    /// No dialect is known by this name.
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// The dialect exists but was not compiled in.
    #[error("Dialect '{0}' is not enabled; enable the '{0}' feature")]
    NotEnabled(String),

    /// A model string could not be split into dialect and model.
    #[error("Invalid model string: {0}")]
    InvalidModelString(String),
}

/// Result type for dialect lookups.
pub type DialectResult<T> = std::result::Result<T, DialectError>;

impl From<DialectError> for chatwire_core::ChatwireError {
    fn from(err: DialectError) -> Self {
        chatwire_core::ChatwireError::Configuration(err.to_string())
    }
}
