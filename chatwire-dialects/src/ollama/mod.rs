//! Ollama dialect.
//!
//! Newline-delimited JSON chat responses. The final line carries
//! `done: true` with token counts and server-side timings.

mod stream;
pub mod types;

pub use stream::OllamaStreamParser;
