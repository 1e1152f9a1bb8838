//! Anthropic messages stream parser.

use super::types::{AnthropicUsage, ContentBlockDelta, ContentBlockStart, StreamEvent};
use crate::parser::{DialectParser, Stopwatch};
use crate::registry::DialectId;
use chatwire_core::{CanonicalAction, Counters};
use chatwire_streaming::WireEvent;
use std::collections::HashMap;

/// Parser for Anthropic `messages` event streams.
#[derive(Debug, Default)]
pub struct AnthropicStreamParser {
    model: String,
    stopwatch: Stopwatch,
    // block index -> tool use id
    tool_blocks: HashMap<usize, String>,
    usage: Counters,
    done: bool,
}

impl AnthropicStreamParser {
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

    fn handle(&mut self, event: StreamEvent) -> Vec<CanonicalAction> {
        match event {
            StreamEvent::MessageStart { message } => {
                let mut actions = Vec::new();
                if let Some(model) = message.model.filter(|m| !m.is_empty()) {
                    actions.push(CanonicalAction::SetModelName { name: model });
                }
                self.usage.update_from(&usage_counters(&message.usage));
                actions.push(CanonicalAction::SetCounters {
                    counters: self.stopwatch.stamp(self.usage.clone()),
                });
                actions
            }

            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlockStart::Text { text } if !text.is_empty() => {
                    self.stopwatch.mark_content();
                    vec![CanonicalAction::text(text)]
                }
                ContentBlockStart::Text { .. } => Vec::new(),
                ContentBlockStart::ToolUse { id, name, input } => {
                    self.stopwatch.mark_content();
                    self.tool_blocks.insert(index, id.clone());
                    let mut actions = vec![CanonicalAction::function_call_start(
                        Some(id.clone()),
                        name,
                    )];
                    // input is normally `{}` and streamed through deltas
                    if input.as_object().is_some_and(|o| !o.is_empty()) {
                        actions.push(CanonicalAction::args_append(Some(id), input.to_string()));
                    }
                    actions
                }
                ContentBlockStart::Other => Vec::new(),
            },

            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                ContentBlockDelta::TextDelta { text } if !text.is_empty() => {
                    self.stopwatch.mark_content();
                    vec![CanonicalAction::text(text)]
                }
                ContentBlockDelta::InputJsonDelta { partial_json } if !partial_json.is_empty() => {
                    let id = self.tool_blocks.get(&index).cloned();
                    vec![CanonicalAction::args_append(id, partial_json)]
                }
                _ => Vec::new(),
            },

            StreamEvent::ContentBlockStop { index } => {
                self.tool_blocks.remove(&index);
                vec![CanonicalAction::EndPart]
            }

            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason {
                    tracing::debug!(stop_reason = %reason, "Anthropic message stopping");
                }
                match usage {
                    Some(usage) => {
                        self.usage.update_from(&usage_counters(&usage));
                        vec![CanonicalAction::SetCounters {
                            counters: self.stopwatch.stamp(self.usage.clone()),
                        }]
                    }
                    None => Vec::new(),
                }
            }

            StreamEvent::MessageStop => {
                self.done = true;
                vec![CanonicalAction::ParserClose]
            }

            StreamEvent::Error { error } => {
                self.done = true;
                let text = if error.message.is_empty() {
                    "anthropic stream reported an error".to_string()
                } else {
                    error.message
                };
                vec![
                    CanonicalAction::issue(text, error.error_type.as_deref()),
                    CanonicalAction::ParserClose,
                ]
            }

            StreamEvent::Ping => Vec::new(),

            StreamEvent::Unknown => {
                tracing::debug!("Ignoring unknown Anthropic event");
                Vec::new()
            }
        }
    }
}

impl DialectParser for AnthropicStreamParser {
    fn dialect(&self) -> DialectId {
        DialectId::Anthropic
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

        match serde_json::from_str::<StreamEvent>(data) {
            Ok(parsed) => self.handle(parsed),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    event_type = event.event_type().unwrap_or("message"),
                    "Malformed Anthropic event"
                );
                self.done = true;
                vec![
                    CanonicalAction::issue(
                        format!("malformed anthropic event: {}", e),
                        Some("parse"),
                    ),
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
            CanonicalAction::issue("stream ended before message_stop", Some("eof")),
            CanonicalAction::ParserClose,
        ]
    }
}

fn usage_counters(usage: &AnthropicUsage) -> Counters {
    Counters {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cache_read_tokens: usage.cache_read_input_tokens,
        cache_write_tokens: usage.cache_creation_input_tokens,
        ..Counters::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_all(
        parser: &mut AnthropicStreamParser,
        frames: &[(&str, &str)],
    ) -> Vec<CanonicalAction> {
        frames
            .iter()
            .flat_map(|(event, data)| parser.parse(&WireEvent::typed(*event, *data)))
            .collect()
    }

    #[test]
    fn test_text_message() {
        let mut parser = AnthropicStreamParser::new();
        let actions = parse_all(
            &mut parser,
            &[
                ("message_start", r#"{"type":"message_start","message":{"id":"msg_1","type":"message","role":"assistant","model":"claude-sonnet-4","usage":{"input_tokens":25,"output_tokens":1}}}"#),
                ("content_block_start", r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#),
                ("ping", r#"{"type":"ping"}"#),
                ("content_block_delta", r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#),
                ("content_block_stop", r#"{"type":"content_block_stop","index":0}"#),
                ("message_delta", r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":15}}"#),
                ("message_stop", r#"{"type":"message_stop"}"#),
            ],
        );

        assert_eq!(
            actions[0],
            CanonicalAction::SetModelName {
                name: "claude-sonnet-4".into()
            }
        );
        assert!(actions.contains(&CanonicalAction::text("Hello")));
        assert_eq!(actions.last(), Some(&CanonicalAction::ParserClose));

        let counters: Vec<&Counters> = actions
            .iter()
            .filter_map(|a| match a {
                CanonicalAction::SetCounters { counters } => Some(counters),
                _ => None,
            })
            .collect();
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].output_tokens, Some(1));
        // final report keeps input tokens from message_start
        assert_eq!(counters[1].input_tokens, Some(25));
        assert_eq!(counters[1].output_tokens, Some(15));
    }

    #[test]
    fn test_tool_use_block() {
        let mut parser = AnthropicStreamParser::new();
        let actions = parse_all(
            &mut parser,
            &[
                ("content_block_start", r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"get_weather","input":{}}}"#),
                ("content_block_delta", r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":""}}"#),
                ("content_block_delta", r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"city\":"}}"#),
                ("content_block_delta", r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"\"Paris\"}"}}"#),
                ("content_block_stop", r#"{"type":"content_block_stop","index":1}"#),
            ],
        );
        assert_eq!(
            actions,
            vec![
                CanonicalAction::function_call_start(Some("toolu_01".into()), "get_weather"),
                CanonicalAction::args_append(Some("toolu_01".into()), r#"{"city":"#),
                CanonicalAction::args_append(Some("toolu_01".into()), r#""Paris"}"#),
                CanonicalAction::EndPart,
            ]
        );
    }

    #[test]
    fn test_thinking_blocks_ignored() {
        let mut parser = AnthropicStreamParser::new();
        let actions = parse_all(
            &mut parser,
            &[
                ("content_block_start", r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#),
                ("content_block_delta", r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"hmm"}}"#),
            ],
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_error_event() {
        let mut parser = AnthropicStreamParser::new();
        let actions = parser.parse(&WireEvent::typed(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        ));
        assert_eq!(
            actions,
            vec![
                CanonicalAction::issue("Overloaded", Some("overloaded_error")),
                CanonicalAction::ParserClose,
            ]
        );
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_eof_before_message_stop() {
        let mut parser = AnthropicStreamParser::new();
        let tail = parser.finish();
        assert!(matches!(tail[0], CanonicalAction::Issue { .. }));
        assert_eq!(tail[1], CanonicalAction::ParserClose);
    }
}
