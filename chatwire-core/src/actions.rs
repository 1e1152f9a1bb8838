//! Canonical generation actions.
//!
//! Every dialect parser lowers its vendor wire format into this vocabulary.
//! The rest of the pipeline never sees vendor payloads.

use crate::counters::Counters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How function-call arguments are delivered by a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgsFormat {
    /// Arguments stream as string fragments of a JSON document.
    IncrementalJson,
    /// Arguments arrive in one piece as a serialized JSON document.
    JsonString,
}

impl fmt::Display for ArgsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsFormat::IncrementalJson => write!(f, "incr_json"),
            ArgsFormat::JsonString => write!(f, "json_s"),
        }
    }
}

/// A human-readable problem reported by a dialect, terminating the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectIssue {
    /// Message suitable for showing to a user.
    pub text: String,
    /// Short marker for the kind of issue (e.g. an emoji or vendor error code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl DialectIssue {
    /// Create a new issue.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            symbol: None,
        }
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

impl fmt::Display for DialectIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            Some(ref symbol) => write!(f, "{} {}", symbol, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Vendor-agnostic action emitted by a dialect parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalAction {
    /// Append text to the current text run.
    Text {
        /// Text delta.
        delta: String,
    },

    /// Open a new function call part.
    FunctionCallStart {
        /// Vendor call id, if the dialect provides one.
        id: Option<String>,
        /// Function name.
        name: String,
        /// How the arguments are delivered.
        args_format: ArgsFormat,
        /// Arguments known at start (complete for `JsonString`).
        args: Option<String>,
    },

    /// Append a fragment to the open function call's arguments.
    FunctionCallArgsAppend {
        /// Call id the fragment belongs to, if the dialect provides one.
        id: Option<String>,
        /// Raw argument fragment, appended verbatim.
        chunk: String,
    },

    /// A complete code execution request.
    CodeExecCall {
        /// Vendor call id, if any.
        id: Option<String>,
        /// Programming language of the code.
        language: String,
        /// Source code to execute.
        code: String,
    },

    /// A complete code execution result.
    CodeExecResponse {
        /// Id of the call this answers, if known.
        id: Option<String>,
        /// Captured output.
        output: String,
        /// Error description when execution failed.
        error: Option<String>,
    },

    /// Close the current part, if any.
    EndPart,

    /// Report the model that is actually generating.
    SetModelName {
        /// Model name as reported upstream.
        name: String,
    },

    /// Report token counts and latency.
    SetCounters {
        /// Counter snapshot; replaces any earlier snapshot.
        counters: Counters,
    },

    /// Report a stream-terminating problem.
    Issue {
        /// The issue.
        issue: DialectIssue,
    },

    /// The dialect saw its completion signal; no more actions follow.
    ParserClose,
}

impl CanonicalAction {
    /// Create a text action.
    pub fn text(delta: impl Into<String>) -> Self {
        Self::Text {
            delta: delta.into(),
        }
    }

    /// Create an incremental function call start with no initial arguments.
    pub fn function_call_start(id: Option<String>, name: impl Into<String>) -> Self {
        Self::FunctionCallStart {
            id,
            name: name.into(),
            args_format: ArgsFormat::IncrementalJson,
            args: None,
        }
    }

    /// Create a function call start whose arguments are already complete.
    pub fn function_call_complete(
        id: Option<String>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self::FunctionCallStart {
            id,
            name: name.into(),
            args_format: ArgsFormat::JsonString,
            args: Some(args.into()),
        }
    }

    /// Create an arguments append action.
    pub fn args_append(id: Option<String>, chunk: impl Into<String>) -> Self {
        Self::FunctionCallArgsAppend {
            id,
            chunk: chunk.into(),
        }
    }

    /// Create an issue action.
    pub fn issue(text: impl Into<String>, symbol: Option<&str>) -> Self {
        let mut issue = DialectIssue::new(text);
        if let Some(symbol) = symbol {
            issue = issue.with_symbol(symbol);
        }
        Self::Issue { issue }
    }

    /// Check if this action ends the stream from the dialect's side.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ParserClose)
    }

    /// Short name used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::FunctionCallStart { .. } => "function_call_start",
            Self::FunctionCallArgsAppend { .. } => "function_call_args_append",
            Self::CodeExecCall { .. } => "code_exec_call",
            Self::CodeExecResponse { .. } => "code_exec_response",
            Self::EndPart => "end_part",
            Self::SetModelName { .. } => "set_model_name",
            Self::SetCounters { .. } => "set_counters",
            Self::Issue { .. } => "issue",
            Self::ParserClose => "parser_close",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_constructor() {
        let action = CanonicalAction::issue("quota exceeded", Some("429"));
        match action {
            CanonicalAction::Issue { issue } => {
                assert_eq!(issue.text, "quota exceeded");
                assert_eq!(issue.to_string(), "429 quota exceeded");
            }
            other => panic!("Expected issue, got {:?}", other),
        }
    }

    #[test]
    fn test_action_serde_tag() {
        let json = serde_json::to_value(CanonicalAction::text("hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["delta"], "hi");

        let json = serde_json::to_value(CanonicalAction::ParserClose).unwrap();
        assert_eq!(json["type"], "parser_close");
    }

    #[test]
    fn test_complete_call_uses_json_string() {
        let action = CanonicalAction::function_call_complete(None, "lookup", "{}");
        assert!(matches!(
            action,
            CanonicalAction::FunctionCallStart {
                args_format: ArgsFormat::JsonString,
                ..
            }
        ));
        assert_eq!(action.kind(), "function_call_start");
        assert!(!action.is_terminal());
    }
}
