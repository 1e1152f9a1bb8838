//! # chatwire-dialects
//!
//! Vendor dialect parsers for chatwire.
//!
//! Each dialect translates one vendor's streamed wire events into the
//! vendor-agnostic [`CanonicalAction`](chatwire_core::CanonicalAction)
//! vocabulary. Parsers never fail; problems surface as issue actions.
//!
//! ## Supported Dialects
//!
//! | Dialect | Framing | Feature |
//! |---------|---------|---------|
//! | OpenAI (and compatible) | event-stream | `openai` |
//! | Anthropic | event-stream | `anthropic` |
//! | Gemini | event-stream | `gemini` |
//! | Ollama | NDJSON | `ollama` |
//!
//! ## Example
//!
//! ```rust
//! use chatwire_core::CanonicalAction;
//! use chatwire_dialects::DialectRegistry;
//! use chatwire_streaming::WireEvent;
//!
//! let registry = DialectRegistry::with_defaults();
//! let mut parser = registry.create_for("openai:gpt-4o").unwrap();
//! let actions = parser.parse(&WireEvent::data("[DONE]"));
//! assert_eq!(actions, vec![CanonicalAction::ParserClose]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod parser;
pub mod registry;

#[cfg(feature = "anthropic")]
#[cfg_attr(docsrs, doc(cfg(feature = "anthropic")))]
pub mod anthropic;
#[cfg(feature = "gemini")]
#[cfg_attr(docsrs, doc(cfg(feature = "gemini")))]
pub mod gemini;
#[cfg(feature = "ollama")]
#[cfg_attr(docsrs, doc(cfg(feature = "ollama")))]
pub mod ollama;
#[cfg(feature = "openai")]
#[cfg_attr(docsrs, doc(cfg(feature = "openai")))]
pub mod openai;

// Re-exports
pub use error::{DialectError, DialectResult};
pub use parser::{DialectParser, Stopwatch};
pub use registry::{parse_model_string, DialectId, DialectRegistry, ParserFactory};

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicStreamParser;
#[cfg(feature = "gemini")]
pub use gemini::GeminiStreamParser;
#[cfg(feature = "ollama")]
pub use ollama::OllamaStreamParser;
#[cfg(feature = "openai")]
pub use openai::OpenAiStreamParser;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{DialectError, DialectId, DialectParser, DialectRegistry};
}
