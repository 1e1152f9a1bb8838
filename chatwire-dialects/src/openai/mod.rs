//! OpenAI dialect.
//!
//! Event-stream chunks of the chat completions API, ending with
//! `data: [DONE]`. OpenAI-compatible vendors (Groq, Mistral, OpenRouter,
//! DeepSeek, xAI, Azure) share this parser.

mod stream;
pub mod types;

pub use stream::OpenAiStreamParser;
