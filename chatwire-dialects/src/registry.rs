//! Dialect identifiers and the parser registry.

use crate::error::{DialectError, DialectResult};
use crate::parser::DialectParser;
use chatwire_streaming::Framing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A vendor wire dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectId {
    /// OpenAI chat completions and compatible vendors.
    OpenAi,
    /// Anthropic messages.
    Anthropic,
    /// Google Gemini `streamGenerateContent`.
    Gemini,
    /// Ollama chat.
    Ollama,
}

impl DialectId {
    /// Every dialect.
    pub const ALL: [DialectId; 4] = [Self::OpenAi, Self::Anthropic, Self::Gemini, Self::Ollama];

    /// Canonical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// Framing the dialect uses on the wire.
    #[must_use]
    pub fn framing(&self) -> Framing {
        match self {
            Self::Ollama => Framing::NdJson,
            _ => Framing::EventStream,
        }
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectId {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAi),
            // OpenAI-compatible vendors
            "groq" | "mistral" | "openrouter" | "or" | "deepseek" | "xai" | "azure" => {
                Ok(Self::OpenAi)
            }
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(DialectError::UnknownDialect(format!(
                "{}. Supported: openai, anthropic, gemini, ollama, groq, mistral, openrouter, deepseek, xai, azure",
                other
            ))),
        }
    }
}

/// Split a `provider:model` string into its dialect and model name.
///
/// Strings without a provider prefix are treated as OpenAI models.
///
/// ```rust
/// use chatwire_dialects::{parse_model_string, DialectId};
///
/// let (dialect, model) = parse_model_string("claude:claude-sonnet-4").unwrap();
/// assert_eq!(dialect, DialectId::Anthropic);
/// assert_eq!(model, "claude-sonnet-4");
/// ```
pub fn parse_model_string(identifier: &str) -> DialectResult<(DialectId, &str)> {
    let (provider, model) = match identifier.split_once(':') {
        Some((provider, model)) => (provider, model),
        None => ("openai", identifier),
    };
    if model.trim().is_empty() {
        return Err(DialectError::InvalidModelString(identifier.to_string()));
    }
    Ok((provider.parse()?, model))
}

/// Creates a fresh parser for one stream of the given model.
pub type ParserFactory = fn(&str) -> Box<dyn DialectParser>;

/// Parser factories keyed by dialect.
#[derive(Clone)]
pub struct DialectRegistry {
    factories: HashMap<DialectId, ParserFactory>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.factories.keys().map(DialectId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("DialectRegistry")
            .field("dialects", &ids)
            .finish()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DialectRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with every compiled-in dialect.
    #[must_use]
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "openai")]
        registry.register(DialectId::OpenAi, |model| {
            Box::new(crate::openai::OpenAiStreamParser::new().with_model(model))
        });
        #[cfg(feature = "anthropic")]
        registry.register(DialectId::Anthropic, |model| {
            Box::new(crate::anthropic::AnthropicStreamParser::new().with_model(model))
        });
        #[cfg(feature = "gemini")]
        registry.register(DialectId::Gemini, |model| {
            Box::new(crate::gemini::GeminiStreamParser::new().with_model(model))
        });
        #[cfg(feature = "ollama")]
        registry.register(DialectId::Ollama, |model| {
            Box::new(crate::ollama::OllamaStreamParser::new().with_model(model))
        });

        registry
    }

    /// Register a factory, returning the one it replaced.
    pub fn register(&mut self, id: DialectId, factory: ParserFactory) -> Option<ParserFactory> {
        self.factories.insert(id, factory)
    }

    /// Check if a dialect has a factory.
    #[must_use]
    pub fn contains(&self, id: DialectId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Registered dialects.
    pub fn dialects(&self) -> impl Iterator<Item = DialectId> + '_ {
        self.factories.keys().copied()
    }

    /// Create a parser for `id` streaming `model`.
    pub fn create(&self, id: DialectId, model: &str) -> DialectResult<Box<dyn DialectParser>> {
        let factory = self
            .factories
            .get(&id)
            .ok_or_else(|| DialectError::NotEnabled(id.to_string()))?;
        tracing::debug!(dialect = %id, model, "Creating dialect parser");
        Ok(factory(model))
    }

    /// Create a parser from a `provider:model` string.
    pub fn create_for(&self, identifier: &str) -> DialectResult<Box<dyn DialectParser>> {
        let (id, model) = parse_model_string(identifier)?;
        self.create(id, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatwire_core::CanonicalAction;
    use chatwire_streaming::WireEvent;
    use rstest::rstest;

    #[rstest]
    #[case("openai", DialectId::OpenAi)]
    #[case("gpt", DialectId::OpenAi)]
    #[case("groq", DialectId::OpenAi)]
    #[case("OpenRouter", DialectId::OpenAi)]
    #[case("claude", DialectId::Anthropic)]
    #[case("google", DialectId::Gemini)]
    #[case(" ollama ", DialectId::Ollama)]
    fn test_dialect_aliases(#[case] name: &str, #[case] expected: DialectId) {
        assert_eq!(name.parse::<DialectId>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_dialect() {
        let err = "cobol".parse::<DialectId>().unwrap_err();
        assert!(matches!(err, DialectError::UnknownDialect(_)));
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_parse_model_string() {
        assert_eq!(
            parse_model_string("gpt-4o").unwrap(),
            (DialectId::OpenAi, "gpt-4o")
        );
        assert_eq!(
            parse_model_string("ollama:llama3.1:8b").unwrap(),
            (DialectId::Ollama, "llama3.1:8b")
        );
        assert!(matches!(
            parse_model_string("anthropic:"),
            Err(DialectError::InvalidModelString(_))
        ));
    }

    #[test]
    fn test_framing_per_dialect() {
        assert_eq!(DialectId::Ollama.framing(), Framing::NdJson);
        assert_eq!(DialectId::Anthropic.framing(), Framing::EventStream);
    }

    struct Echo(String);

    impl DialectParser for Echo {
        fn dialect(&self) -> DialectId {
            DialectId::OpenAi
        }

        fn model(&self) -> &str {
            &self.0
        }

        fn parse(&mut self, event: &WireEvent) -> Vec<CanonicalAction> {
            event
                .payload()
                .map(|p| vec![CanonicalAction::text(p)])
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_register_replaces_factory() {
        let mut registry = DialectRegistry::new();
        assert!(matches!(
            registry.create(DialectId::OpenAi, "gpt-4o"),
            Err(DialectError::NotEnabled(_))
        ));

        registry.register(DialectId::OpenAi, |model| Box::new(Echo(model.to_string())));
        let mut parser = registry.create_for("gpt:gpt-4o-mini").unwrap();
        assert_eq!(parser.model(), "gpt-4o-mini");
        assert_eq!(
            parser.parse(&WireEvent::data("x")),
            vec![CanonicalAction::text("x")]
        );
        // default finish treats an early close as an issue
        let tail = parser.finish();
        assert!(matches!(tail[0], CanonicalAction::Issue { .. }));
        assert_eq!(tail[1], CanonicalAction::ParserClose);
    }

    #[cfg(all(
        feature = "openai",
        feature = "anthropic",
        feature = "gemini",
        feature = "ollama"
    ))]
    #[test]
    fn test_defaults_cover_every_dialect() {
        let registry = DialectRegistry::with_defaults();
        for id in DialectId::ALL {
            let parser = registry.create(id, "some-model").unwrap();
            assert_eq!(parser.dialect(), id);
            assert_eq!(parser.model(), "some-model");
            assert_eq!(parser.framing(), id.framing());
        }
    }
}
