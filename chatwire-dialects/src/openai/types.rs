//! OpenAI chat completion chunk types.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// One streamed chat completion chunk.
///
/// Error frames share the event stream with chunks, so `error` lives here
/// too and every other field defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionChunk {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Model used.
    #[serde(default)]
    pub model: Option<String>,
    /// Response choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Token usage (if stream_options.include_usage is true).
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Error reported mid-stream.
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Chunk choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// Delta content.
    #[serde(default)]
    pub delta: ChunkDelta,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Chunk delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    /// Role (usually only in first chunk).
    #[serde(default)]
    pub role: Option<String>,
    /// Text content delta.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls delta.
    #[serde(default)]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
    /// Refusal text delta.
    #[serde(default)]
    pub refusal: Option<String>,
}

/// Chunk tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkToolCall {
    /// Index of this tool call.
    #[serde(default)]
    pub index: u32,
    /// Tool call ID (only in first chunk for this tool).
    #[serde(default)]
    pub id: Option<String>,
    /// Function call delta.
    #[serde(default)]
    pub function: Option<ChunkFunction>,
}

/// Chunk function.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkFunction {
    /// Function name (only in first chunk for this tool).
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments fragment.
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Prompt token details.
    #[serde(default)]
    pub prompt_tokens_details: Option<PromptTokensDetails>,
}

/// Prompt token details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptTokensDetails {
    /// Cached tokens.
    #[serde(default)]
    pub cached_tokens: Option<u64>,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code; a string or a number depending on the vendor.
    #[serde(default)]
    pub code: Option<JsonValue>,
}

impl ApiError {
    /// Short symbol for the error: its code, else its type.
    pub fn symbol(&self) -> Option<String> {
        match &self.code {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => self.error_type.clone(),
        }
    }
}
