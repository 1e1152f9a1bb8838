//! Anthropic messages stream types.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Event-stream event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Message start.
    MessageStart {
        /// Partial message.
        message: PartialMessage,
    },
    /// Content block start.
    ContentBlockStart {
        /// Block index.
        index: usize,
        /// Content block.
        content_block: ContentBlockStart,
    },
    /// Content block delta.
    ContentBlockDelta {
        /// Block index.
        index: usize,
        /// Delta content.
        delta: ContentBlockDelta,
    },
    /// Content block stop.
    ContentBlockStop {
        /// Block index.
        index: usize,
    },
    /// Message delta.
    MessageDelta {
        /// Delta.
        #[serde(default)]
        delta: MessageDelta,
        /// Usage.
        #[serde(default)]
        usage: Option<AnthropicUsage>,
    },
    /// Message stop.
    MessageStop,
    /// Ping (keep-alive).
    Ping,
    /// Error.
    Error {
        /// Error details.
        error: StreamErrorBody,
    },
    /// Event types this parser does not know.
    #[serde(other)]
    Unknown,
}

/// Partial message at stream start.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialMessage {
    /// Message ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Model.
    #[serde(default)]
    pub model: Option<String>,
    /// Initial usage.
    #[serde(default)]
    pub usage: AnthropicUsage,
}

/// Content block start.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockStart {
    /// Text block start.
    Text {
        /// Initial text (usually empty).
        #[serde(default)]
        text: String,
    },
    /// Tool use start.
    ToolUse {
        /// Tool call ID.
        id: String,
        /// Tool name.
        name: String,
        /// Initial input (usually an empty object).
        #[serde(default)]
        input: JsonValue,
    },
    /// Thinking and other blocks without a part of their own.
    #[serde(other)]
    Other,
}

/// Content block delta.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockDelta {
    /// Text delta.
    TextDelta {
        /// Text content.
        text: String,
    },
    /// Tool input JSON delta.
    InputJsonDelta {
        /// Partial JSON.
        partial_json: String,
    },
    /// Thinking, signature and citation deltas.
    #[serde(other)]
    Other,
}

/// Message delta at stream end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDelta {
    /// Stop reason.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Token usage. Partial in `message_delta`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnthropicUsage {
    /// Input tokens.
    #[serde(default)]
    pub input_tokens: Option<u64>,
    /// Output tokens.
    #[serde(default)]
    pub output_tokens: Option<u64>,
    /// Tokens used to create cache.
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    /// Tokens read from cache.
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

/// Stream error.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamErrorBody {
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error message.
    #[serde(default)]
    pub message: String,
}
