//! Ollama chat stream types.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// One NDJSON line of a streamed chat response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    /// Model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Message delta.
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    /// Whether this is the final line.
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped.
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Total duration (nanoseconds).
    #[serde(default)]
    pub total_duration: Option<u64>,
    /// Model load duration (nanoseconds).
    #[serde(default)]
    pub load_duration: Option<u64>,
    /// Prompt evaluation count.
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Prompt evaluation duration (nanoseconds).
    #[serde(default)]
    pub prompt_eval_duration: Option<u64>,
    /// Evaluation count (output tokens).
    #[serde(default)]
    pub eval_count: Option<u64>,
    /// Evaluation duration (nanoseconds).
    #[serde(default)]
    pub eval_duration: Option<u64>,
    /// Error message, sent instead of a message.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    /// Role.
    #[serde(default)]
    pub role: Option<String>,
    /// Content delta.
    #[serde(default)]
    pub content: String,
    /// Tool calls, each complete.
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Function call.
    pub function: FunctionCall,
}

/// Function call.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments (already a JSON object).
    #[serde(default)]
    pub arguments: JsonValue,
}
