//! Gemini stream parser.

use super::types::{ContentPart, GenerateContentResponse, UsageMetadata};
use crate::parser::{DialectParser, Stopwatch};
use crate::registry::DialectId;
use chatwire_core::{CanonicalAction, Counters};
use chatwire_streaming::WireEvent;

/// Finish reasons that mean the output was cut short by the vendor.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "LANGUAGE",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
    "MALFORMED_FUNCTION_CALL",
    "OTHER",
];

/// Parser for Gemini `streamGenerateContent?alt=sse` streams.
#[derive(Debug, Default)]
pub struct GeminiStreamParser {
    model: String,
    stopwatch: Stopwatch,
    model_reported: bool,
    done: bool,
}

impl GeminiStreamParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn handle(&mut self, response: GenerateContentResponse) -> Vec<CanonicalAction> {
        if let Some(error) = response.error {
            self.done = true;
            let symbol = error
                .status
                .or_else(|| error.code.map(|c| c.to_string()));
            return vec![
                CanonicalAction::issue(error.message, symbol.as_deref()),
                CanonicalAction::ParserClose,
            ];
        }

        let mut actions = Vec::new();

        if !self.model_reported {
            if let Some(model) = response.model_version.filter(|m| !m.is_empty()) {
                self.model_reported = true;
                actions.push(CanonicalAction::SetModelName { name: model });
            }
        }

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            self.done = true;
            actions.push(CanonicalAction::issue(
                format!("prompt blocked: {}", reason),
                Some(reason.as_str()),
            ));
            actions.push(CanonicalAction::ParserClose);
            return actions;
        }

        let mut finish_reason = None;
        // only the first candidate is rendered
        if let Some(candidate) = response.candidates.into_iter().next() {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                self.content_part(part, &mut actions);
            }
            finish_reason = candidate.finish_reason;
        }

        if let Some(usage) = response.usage_metadata {
            actions.push(CanonicalAction::SetCounters {
                counters: self.stopwatch.stamp(usage_counters(&usage)),
            });
        }

        match finish_reason.as_deref() {
            None | Some("FINISH_REASON_UNSPECIFIED") => {}
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => {
                self.done = true;
                actions.push(CanonicalAction::issue(
                    format!("generation stopped: {}", reason),
                    Some(reason),
                ));
                actions.push(CanonicalAction::ParserClose);
            }
            Some(reason) => {
                tracing::debug!(finish_reason = reason, "Gemini candidate finished");
                self.done = true;
                actions.push(CanonicalAction::ParserClose);
            }
        }

        actions
    }

    fn content_part(&mut self, part: ContentPart, actions: &mut Vec<CanonicalAction>) {
        if part.thought == Some(true) {
            return;
        }

        if let Some(text) = part.text.filter(|t| !t.is_empty()) {
            self.stopwatch.mark_content();
            actions.push(CanonicalAction::text(text));
        }

        if let Some(call) = part.function_call {
            self.stopwatch.mark_content();
            let args = if call.args.is_null() {
                "{}".to_string()
            } else {
                call.args.to_string()
            };
            actions.push(CanonicalAction::function_call_complete(
                call.id, call.name, args,
            ));
            actions.push(CanonicalAction::EndPart);
        }

        if let Some(code) = part.executable_code {
            self.stopwatch.mark_content();
            actions.push(CanonicalAction::CodeExecCall {
                id: None,
                language: code.language.to_ascii_lowercase(),
                code: code.code,
            });
        }

        if let Some(result) = part.code_execution_result {
            let error = (!result.is_ok()).then(|| result.outcome.clone());
            actions.push(CanonicalAction::CodeExecResponse {
                id: None,
                output: result.output,
                error,
            });
        }
    }
}

impl DialectParser for GeminiStreamParser {
    fn dialect(&self) -> DialectId {
        DialectId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn parse(&mut self, event: &WireEvent) -> Vec<CanonicalAction> {
        let Some(data) = event.payload() else {
            return Vec::new();
        };
        let data = data.trim();
        if data.is_empty() || self.done {
            return Vec::new();
        }

        match serde_json::from_str::<GenerateContentResponse>(data) {
            Ok(response) => self.handle(response),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed Gemini response frame");
                self.done = true;
                vec![
                    CanonicalAction::issue(format!("malformed gemini frame: {}", e), Some("parse")),
                    CanonicalAction::ParserClose,
                ]
            }
        }
    }

    /// Gemini has no completion sentinel beyond the finish reason, so a
    /// transport close completes the stream.
    fn finish(&mut self) -> Vec<CanonicalAction> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        vec![CanonicalAction::ParserClose]
    }
}

fn usage_counters(usage: &UsageMetadata) -> Counters {
    Counters {
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
        cache_read_tokens: usage.cached_content_token_count,
        ..Counters::default()
    }
}
