//! Ollama NDJSON stream parser.

use super::types::ChatResponse;
use crate::parser::{DialectParser, Stopwatch};
use crate::registry::DialectId;
use chatwire_core::{CanonicalAction, Counters};
use chatwire_streaming::WireEvent;
use std::time::Duration;

/// Parser for Ollama `/api/chat` streams.
#[derive(Debug, Default)]
pub struct OllamaStreamParser {
    model: String,
    stopwatch: Stopwatch,
    model_reported: bool,
    done: bool,
}

impl OllamaStreamParser {
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

    fn handle(&mut self, mut response: ChatResponse) -> Vec<CanonicalAction> {
        if let Some(error) = response.error.take() {
            self.done = true;
            return vec![
                CanonicalAction::issue(error, Some("ollama")),
                CanonicalAction::ParserClose,
            ];
        }

        let mut actions = Vec::new();

        if !self.model_reported {
            if let Some(model) = response.model.take().filter(|m| !m.is_empty()) {
                self.model_reported = true;
                actions.push(CanonicalAction::SetModelName { name: model });
            }
        }

        if let Some(message) = response.message.take() {
            if !message.content.is_empty() {
                self.stopwatch.mark_content();
                actions.push(CanonicalAction::text(message.content));
            }
            for call in message.tool_calls.unwrap_or_default() {
                self.stopwatch.mark_content();
                let args = if call.function.arguments.is_null() {
                    "{}".to_string()
                } else {
                    call.function.arguments.to_string()
                };
                actions.push(CanonicalAction::function_call_complete(
                    None,
                    call.function.name,
                    args,
                ));
                actions.push(CanonicalAction::EndPart);
            }
        }

        if response.done {
            tracing::debug!(
                done_reason = response.done_reason.as_deref().unwrap_or("stop"),
                "Ollama stream done"
            );
            self.done = true;
            actions.push(CanonicalAction::SetCounters {
                counters: self.final_counters(&response),
            });
            actions.push(CanonicalAction::ParserClose);
        }

        actions
    }

    /// Ollama reports its own server-side timings on the final line; they
    /// win over the local stopwatch.
    fn final_counters(&self, response: &ChatResponse) -> Counters {
        let mut counters = Counters {
            input_tokens: response.prompt_eval_count,
            output_tokens: response.eval_count,
            ..Counters::default()
        };
        let local = self.stopwatch.stamp(Counters::new()).latency;

        let server_start = match (response.load_duration, response.prompt_eval_duration) {
            (None, None) => None,
            (load, prompt) => Some(load.unwrap_or(0) + prompt.unwrap_or(0)),
        };
        counters = counters.latency(
            server_start.map(Duration::from_nanos),
            response.eval_duration.map(Duration::from_nanos),
            response.total_duration.map(Duration::from_nanos),
        );
        let mut merged = Counters::new();
        merged.latency = local;
        merged.update_from(&counters);
        merged
    }
}

impl DialectParser for OllamaStreamParser {
    fn dialect(&self) -> DialectId {
        DialectId::Ollama
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

        match serde_json::from_str::<ChatResponse>(data) {
            Ok(response) => self.handle(response),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed Ollama line");
                self.done = true;
                vec![
                    CanonicalAction::issue(format!("malformed ollama line: {}", e), Some("parse")),
                    CanonicalAction::ParserClose,
                ]
            }
        }
    }

    fn finish(&mut self) -> Vec<CanonicalAction> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        vec![
            CanonicalAction::issue("stream ended before done", Some("eof")),
            CanonicalAction::ParserClose,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(parser: &mut OllamaStreamParser, line: &str) -> Vec<CanonicalAction> {
        parser.parse(&WireEvent::data(line))
    }

    #[test]
    fn test_content_then_done() {
        let mut parser = OllamaStreamParser::new();
        let first = parse(
            &mut parser,
            r#"{"model":"llama3.1","created_at":"2024-07-01T00:00:00Z","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        );
        assert_eq!(
            first,
            vec![
                CanonicalAction::SetModelName {
                    name: "llama3.1".into()
                },
                CanonicalAction::text("Hi"),
            ]
        );

        let last = parse(
            &mut parser,
            r#"{"model":"llama3.1","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","total_duration":5000000000,"load_duration":1000000000,"prompt_eval_count":26,"prompt_eval_duration":500000000,"eval_count":290,"eval_duration":3000000000}"#,
        );
        assert_eq!(last.len(), 2);
        match &last[0] {
            CanonicalAction::SetCounters { counters } => {
                assert_eq!(counters.input_tokens, Some(26));
                assert_eq!(counters.output_tokens, Some(290));
                assert_eq!(counters.latency.start_ms, Some(1500));
                assert_eq!(counters.latency.inner_ms, Some(3000));
                assert_eq!(counters.latency.all_ms, Some(5000));
            }
            other => panic!("Expected counters, got {:?}", other),
        }
        assert_eq!(last[1], CanonicalAction::ParserClose);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_tool_calls_complete() {
        let mut parser = OllamaStreamParser::new();
        let actions = parse(
            &mut parser,
            r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"get_weather","arguments":{"city":"Toronto"}}}]},"done":false}"#,
        );
        assert_eq!(
            actions,
            vec![
                CanonicalAction::function_call_complete(
                    None,
                    "get_weather",
                    r#"{"city":"Toronto"}"#
                ),
                CanonicalAction::EndPart,
            ]
        );
    }

    #[test]
    fn test_error_line() {
        let mut parser = OllamaStreamParser::new();
        let actions = parse(&mut parser, r#"{"error":"model 'nope' not found"}"#);
        assert_eq!(
            actions,
            vec![
                CanonicalAction::issue("model 'nope' not found", Some("ollama")),
                CanonicalAction::ParserClose,
            ]
        );
    }

    #[test]
    fn test_eof_before_done() {
        let mut parser = OllamaStreamParser::new();
        parse(
            &mut parser,
            r#"{"message":{"content":"cut"},"done":false}"#,
        );
        assert!(matches!(parser.finish()[0], CanonicalAction::Issue { .. }));
    }
}
