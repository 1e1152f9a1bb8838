//! OpenAI chat completion stream parser.
//!
//! Handles OpenAI and the vendors that mirror its chunk format.

use super::types::{ChatCompletionChunk, ChunkToolCall, Usage};
use crate::parser::{DialectParser, Stopwatch};
use crate::registry::DialectId;
use chatwire_core::{CanonicalAction, Counters};
use chatwire_streaming::WireEvent;
use std::collections::HashMap;

const DONE_SENTINEL: &str = "[DONE]";

/// Parser for OpenAI `chat/completions` event streams.
#[derive(Debug, Default)]
pub struct OpenAiStreamParser {
    model: String,
    stopwatch: Stopwatch,
    model_reported: bool,
    // stream index -> vendor call id
    tool_calls: HashMap<u32, Option<String>>,
    finish_reason: Option<String>,
    done: bool,
}

impl OpenAiStreamParser {
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

    fn parse_chunk(&mut self, chunk: ChatCompletionChunk) -> Vec<CanonicalAction> {
        let mut actions = Vec::new();

        if let Some(error) = chunk.error {
            let symbol = error.symbol();
            let text = if error.message.is_empty() {
                "openai stream reported an error".to_string()
            } else {
                error.message
            };
            self.done = true;
            actions.push(CanonicalAction::issue(text, symbol.as_deref()));
            actions.push(CanonicalAction::ParserClose);
            return actions;
        }

        if !self.model_reported {
            if let Some(model) = chunk.model.filter(|m| !m.is_empty()) {
                self.model_reported = true;
                actions.push(CanonicalAction::SetModelName { name: model });
            }
        }

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                self.stopwatch.mark_content();
                actions.push(CanonicalAction::text(content));
            }
            if let Some(refusal) = choice.delta.refusal.filter(|r| !r.is_empty()) {
                self.stopwatch.mark_content();
                actions.push(CanonicalAction::text(refusal));
            }
            for tool_call in choice.delta.tool_calls.unwrap_or_default() {
                self.stopwatch.mark_content();
                self.tool_call_delta(tool_call, &mut actions);
            }

            if let Some(reason) = choice.finish_reason {
                tracing::debug!(finish_reason = %reason, "OpenAI choice finished");
                if reason == "content_filter" {
                    self.done = true;
                    actions.push(CanonicalAction::issue(
                        "response blocked by content filter",
                        Some("content_filter"),
                    ));
                    actions.push(CanonicalAction::ParserClose);
                    return actions;
                }
                self.finish_reason = Some(reason);
            }
        }

        if let Some(usage) = chunk.usage {
            actions.push(CanonicalAction::SetCounters {
                counters: self.stopwatch.stamp(usage_counters(&usage)),
            });
        }

        actions
    }

    fn tool_call_delta(&mut self, tool_call: ChunkToolCall, actions: &mut Vec<CanonicalAction>) {
        let function = tool_call.function.unwrap_or_default();

        let incoming = tool_call.id.filter(|id| !id.is_empty());
        let known = self.tool_calls.get(&tool_call.index);
        // Some compatible vendors reuse an index for the next call
        let starts_call = match (known, incoming.as_ref()) {
            (None, _) => true,
            (Some(Some(current)), Some(incoming)) => current != incoming,
            _ => false,
        };

        let id = if starts_call {
            let name = function.name.clone().unwrap_or_default();
            tracing::debug!(index = tool_call.index, name = %name, "OpenAI tool call started");
            self.tool_calls.insert(tool_call.index, incoming.clone());
            actions.push(CanonicalAction::function_call_start(incoming.clone(), name));
            incoming
        } else {
            known.cloned().flatten()
        };

        if let Some(arguments) = function.arguments.filter(|a| !a.is_empty()) {
            actions.push(CanonicalAction::args_append(id, arguments));
        }
    }
}

impl DialectParser for OpenAiStreamParser {
    fn dialect(&self) -> DialectId {
        DialectId::OpenAi
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

        if data == DONE_SENTINEL {
            self.done = true;
            return vec![CanonicalAction::ParserClose];
        }

        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => self.parse_chunk(chunk),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed OpenAI chunk");
                self.done = true;
                vec![
                    CanonicalAction::issue(format!("malformed openai chunk: {}", e), Some("parse")),
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
        // Some compatible vendors close after the finish reason without [DONE]
        if self.finish_reason.is_some() {
            return vec![CanonicalAction::ParserClose];
        }
        vec![
            CanonicalAction::issue("stream ended before completion", Some("eof")),
            CanonicalAction::ParserClose,
        ]
    }
}

fn usage_counters(usage: &Usage) -> Counters {
    let mut counters = Counters::with_tokens(usage.prompt_tokens, usage.completion_tokens);
    if let Some(cached) = usage
        .prompt_tokens_details
        .as_ref()
        .and_then(|d| d.cached_tokens)
    {
        counters = counters.cache_read_tokens(cached);
    }
    counters
}
