//! Generated output parts.
//!
//! A [`Part`] is a contiguous, typed span of output. It is created open,
//! accumulates content, and is closed exactly once. Mutators refuse to touch
//! a closed part, so a flushed part can be handed to a store as-is.

use crate::actions::ArgsFormat;
use crate::errors::InvalidActionSequence;
use crate::identifier::PartId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    /// A run of text.
    Text,
    /// A function (tool) call.
    FunctionCall,
    /// A request to execute code.
    CodeExecRequest,
    /// The result of a code execution.
    CodeExecResponse,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Text => write!(f, "text"),
            PartKind::FunctionCall => write!(f, "function_call"),
            PartKind::CodeExecRequest => write!(f, "code_exec_request"),
            PartKind::CodeExecResponse => write!(f, "code_exec_response"),
        }
    }
}

/// Lifecycle state of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartState {
    /// Still accumulating content.
    Open,
    /// Flushed and immutable.
    Closed,
}

/// Accumulated function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call id, vendor-assigned or synthetic.
    pub call_id: String,
    /// Function name.
    pub name: String,
    /// How the arguments were delivered.
    pub args_format: ArgsFormat,
    /// Raw argument text, concatenated verbatim.
    pub args: String,
}

/// A code execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExecRequest {
    /// Call id, vendor-assigned or synthetic.
    pub call_id: String,
    /// Programming language.
    pub language: String,
    /// Source code.
    pub code: String,
}

/// A code execution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExecResponse {
    /// Id of the request this answers.
    pub call_id: String,
    /// Captured output.
    pub output: String,
    /// Error description when the execution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Content of a part, by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartContent {
    /// Text run.
    Text {
        /// Accumulated text.
        text: String,
    },
    /// Function call.
    FunctionCall(FunctionCall),
    /// Code execution request.
    CodeExecRequest(CodeExecRequest),
    /// Code execution response.
    CodeExecResponse(CodeExecResponse),
}

impl PartContent {
    /// Kind of this content.
    #[must_use]
    pub fn kind(&self) -> PartKind {
        match self {
            Self::Text { .. } => PartKind::Text,
            Self::FunctionCall(_) => PartKind::FunctionCall,
            Self::CodeExecRequest(_) => PartKind::CodeExecRequest,
            Self::CodeExecResponse(_) => PartKind::CodeExecResponse,
        }
    }
}

/// A typed span of generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    id: PartId,
    state: PartState,
    content: PartContent,
}

impl Part {
    /// Create an open text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::open(PartContent::Text { text: text.into() })
    }

    /// Create an open function call part.
    #[must_use]
    pub fn function_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        args_format: ArgsFormat,
        args: impl Into<String>,
    ) -> Self {
        Self::open(PartContent::FunctionCall(FunctionCall {
            call_id: call_id.into(),
            name: name.into(),
            args_format,
            args: args.into(),
        }))
    }

    /// Create an open code execution request part.
    #[must_use]
    pub fn code_exec_request(
        call_id: impl Into<String>,
        language: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::open(PartContent::CodeExecRequest(CodeExecRequest {
            call_id: call_id.into(),
            language: language.into(),
            code: code.into(),
        }))
    }

    /// Create an open code execution response part.
    #[must_use]
    pub fn code_exec_response(
        call_id: impl Into<String>,
        output: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        Self::open(PartContent::CodeExecResponse(CodeExecResponse {
            call_id: call_id.into(),
            output: output.into(),
            error,
        }))
    }

    fn open(content: PartContent) -> Self {
        Self {
            id: PartId::new(),
            state: PartState::Open,
            content,
        }
    }

    /// Part id.
    #[must_use]
    pub fn id(&self) -> &PartId {
        &self.id
    }

    /// Part kind.
    #[must_use]
    pub fn kind(&self) -> PartKind {
        self.content.kind()
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> PartState {
        self.state
    }

    /// Check if the part is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == PartState::Closed
    }

    /// Part content.
    #[must_use]
    pub fn content(&self) -> &PartContent {
        &self.content
    }

    /// Text of a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            PartContent::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Function call of a function call part.
    #[must_use]
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match &self.content {
            PartContent::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    /// Call id of a function call or code execution part.
    #[must_use]
    pub fn call_id(&self) -> Option<&str> {
        match &self.content {
            PartContent::Text { .. } => None,
            PartContent::FunctionCall(c) => Some(&c.call_id),
            PartContent::CodeExecRequest(c) => Some(&c.call_id),
            PartContent::CodeExecResponse(c) => Some(&c.call_id),
        }
    }

    /// Append text to an open text part.
    pub fn append_text(&mut self, delta: &str) -> Result<(), InvalidActionSequence> {
        self.ensure_open()?;
        match &mut self.content {
            PartContent::Text { text } => {
                text.push_str(delta);
                Ok(())
            }
            other => Err(InvalidActionSequence::new(format!(
                "cannot append text to a {} part",
                other.kind()
            ))),
        }
    }

    /// Append a raw argument fragment to an open function call part.
    pub fn append_args(&mut self, chunk: &str) -> Result<(), InvalidActionSequence> {
        self.ensure_open()?;
        match &mut self.content {
            PartContent::FunctionCall(call) => {
                call.args.push_str(chunk);
                Ok(())
            }
            other => Err(InvalidActionSequence::new(format!(
                "cannot append arguments to a {} part",
                other.kind()
            ))),
        }
    }

    /// Close the part. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = PartState::Closed;
        true
    }

    /// Parse the accumulated function call arguments as JSON.
    ///
    /// Arguments are only meaningful once every fragment has arrived, so
    /// this refuses open parts. Empty arguments parse as an empty object.
    pub fn parsed_args(&self) -> crate::Result<serde_json::Value> {
        let call = self.as_function_call().ok_or_else(|| {
            InvalidActionSequence::new(format!("{} part has no arguments", self.kind()))
        })?;
        if !self.is_closed() {
            return Err(InvalidActionSequence::new("arguments are still streaming")
                .with_call_id(call.call_id.clone())
                .into());
        }
        if call.args.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(&call.args)?)
    }

    fn ensure_open(&self) -> Result<(), InvalidActionSequence> {
        if self.is_closed() {
            return Err(InvalidActionSequence::new(format!(
                "part {} is closed",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_part_accumulates() {
        let mut part = Part::text("Hi");
        part.append_text(" there").unwrap();
        assert_eq!(part.as_text(), Some("Hi there"));
        assert_eq!(part.kind(), PartKind::Text);
        assert_eq!(part.state(), PartState::Open);
    }

    #[test]
    fn test_closed_part_is_immutable() {
        let mut part = Part::text("done");
        assert!(part.close());
        assert!(!part.close());
        assert!(part.append_text("more").is_err());
        assert_eq!(part.as_text(), Some("done"));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let mut part = Part::text("");
        assert!(part.append_args("{}").is_err());

        let mut call = Part::function_call("call_1", "f", ArgsFormat::IncrementalJson, "");
        assert!(call.append_text("x").is_err());
    }

    #[test]
    fn test_args_parse_after_close() {
        let mut part = Part::function_call("call_1", "sum", ArgsFormat::IncrementalJson, "");
        part.append_args(r#"{"a":1"#).unwrap();
        part.append_args("23}").unwrap();
        assert!(part.parsed_args().is_err());

        part.close();
        assert_eq!(part.parsed_args().unwrap(), json!({"a": 123}));
        assert_eq!(part.call_id(), Some("call_1"));
    }

    #[test]
    fn test_empty_args_parse_as_object() {
        let mut part = Part::function_call("call_2", "ping", ArgsFormat::JsonString, "");
        part.close();
        assert_eq!(part.parsed_args().unwrap(), json!({}));
    }

    #[test]
    fn test_content_serde_tag() {
        let part = Part::code_exec_response("call_3", "4\n", None);
        let json = serde_json::to_value(part.content()).unwrap();
        assert_eq!(json["kind"], "code_exec_response");
        assert_eq!(json["output"], "4\n");
    }
}
