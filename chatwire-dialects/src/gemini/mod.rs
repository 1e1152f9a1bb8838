//! Google Gemini dialect.
//!
//! Every event-stream frame is a full `GenerateContentResponse`. Function
//! calls and code execution arrive complete, never as fragments.

mod stream;
pub mod types;

pub use stream::GeminiStreamParser;
