//! Anthropic dialect.
//!
//! Typed event-stream frames of the messages API. Each content block maps
//! to one part; `message_stop` completes the stream.

mod stream;
pub mod types;

pub use stream::AnthropicStreamParser;
