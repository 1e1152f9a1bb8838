//! Gemini `streamGenerateContent` response types.

use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Generate content response. Every streamed frame is one of these.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Usage metadata.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    /// Model version.
    #[serde(default)]
    pub model_version: Option<String>,
    /// Prompt feedback (for blocked prompts).
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Error reported mid-stream.
    #[serde(default)]
    pub error: Option<GoogleErrorBody>,
}

/// Response candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content.
    #[serde(default)]
    pub content: Option<Content>,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Index.
    #[serde(default)]
    pub index: Option<u32>,
}

/// Candidate content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    /// Role.
    #[serde(default)]
    pub role: Option<String>,
    /// Parts.
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

/// Content part. Exactly one payload field is set on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPart {
    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
    /// Set on thought summaries.
    #[serde(default)]
    pub thought: Option<bool>,
    /// Function call.
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    /// Code the model wants executed.
    #[serde(default)]
    pub executable_code: Option<ExecutableCode>,
    /// Result of executing that code.
    #[serde(default)]
    pub code_execution_result: Option<CodeExecutionResult>,
}

/// Function call from the model.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    /// Call id (newer models only).
    #[serde(default)]
    pub id: Option<String>,
    /// Function name.
    pub name: String,
    /// Function arguments.
    #[serde(default)]
    pub args: JsonValue,
}

/// Executable code from code execution.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutableCode {
    /// Programming language.
    #[serde(default)]
    pub language: String,
    /// The code.
    #[serde(default)]
    pub code: String,
}

/// Result of code execution.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeExecutionResult {
    /// Execution outcome.
    #[serde(default)]
    pub outcome: String,
    /// Output text.
    #[serde(default)]
    pub output: String,
}

impl CodeExecutionResult {
    /// Check if the code ran successfully.
    pub fn is_ok(&self) -> bool {
        self.outcome == "OUTCOME_OK"
    }
}

/// Usage metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt token count.
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    /// Candidates token count.
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
    /// Cached content token count.
    #[serde(default)]
    pub cached_content_token_count: Option<u64>,
}

/// Prompt feedback (for blocked prompts).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Google error body.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    /// Error code.
    #[serde(default)]
    pub code: Option<u32>,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error status.
    #[serde(default)]
    pub status: Option<String>,
}
