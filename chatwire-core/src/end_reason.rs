//! Why a stream ended.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal reason of a generation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// The dialect saw its normal completion signal.
    DoneDialect,
    /// The dialect reported a terminating issue.
    IssueDialect,
    /// The caller aborted the stream.
    Aborted,
    /// The byte stream failed after streaming had started.
    TransportError,
    /// The dialect emitted actions the transmitter could not accept.
    ParserError,
}

impl EndReason {
    /// Check if this reason may be reported by a dialect parser.
    ///
    /// `Aborted` and `TransportError` belong to the orchestrator, and
    /// `ParserError` is raised by the transmitter itself.
    #[must_use]
    pub fn is_dialect_reason(&self) -> bool {
        matches!(self, Self::DoneDialect | Self::IssueDialect)
    }

    /// Check if the stream completed normally.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::DoneDialect)
    }

    /// Wire name of the reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoneDialect => "done-dialect",
            Self::IssueDialect => "issue-dialect",
            Self::Aborted => "aborted",
            Self::TransportError => "transport-error",
            Self::ParserError => "parser-error",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EndReason::DoneDialect, "\"done-dialect\"")]
    #[case(EndReason::IssueDialect, "\"issue-dialect\"")]
    #[case(EndReason::Aborted, "\"aborted\"")]
    #[case(EndReason::TransportError, "\"transport-error\"")]
    #[case(EndReason::ParserError, "\"parser-error\"")]
    fn test_wire_names(#[case] reason: EndReason, #[case] json: &str) {
        assert_eq!(serde_json::to_string(&reason).unwrap(), json);
        assert_eq!(format!("\"{}\"", reason), json);
    }

    #[test]
    fn test_dialect_reasons() {
        assert!(EndReason::DoneDialect.is_dialect_reason());
        assert!(EndReason::IssueDialect.is_dialect_reason());
        assert!(!EndReason::Aborted.is_dialect_reason());
        assert!(!EndReason::TransportError.is_dialect_reason());
    }
}
