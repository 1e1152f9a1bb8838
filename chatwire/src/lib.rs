//! # chatwire - Streaming Chat-Generation Dispatch
//!
//! chatwire turns a vendor's streamed chat-completion response into an
//! ordered log of closed message parts. Bytes go through a demuxer, a
//! dialect parser and a part transmitter; a decimator bounds how often the
//! consumer is asked to repaint the part still being generated.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chatwire::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = Dispatcher::new(DispatchConfig::from_env("openai:gpt-4o")?);
//!     let request = StreamRequest::new(
//!         "https://api.openai.com/v1/chat/completions",
//!         serde_json::json!({"model": "gpt-4o", "stream": true, "messages": []}),
//!     )
//!     .bearer_auth(std::env::var("OPENAI_API_KEY")?);
//!
//!     let mut events: Vec<PartEvent> = Vec::new();
//!     let outcome = dispatcher
//!         .run(&ReqwestTransport::new(), &request, &mut events, CancellationToken::new())
//!         .await?;
//!     println!("{} ({})", outcome.text(), outcome.end_reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `openai` | OpenAI chat completions and compatible vendors | ✅ |
//! | `anthropic` | Anthropic messages | ✅ |
//! | `gemini` | Google Gemini `streamGenerateContent` | ✅ |
//! | `ollama` | Ollama `/api/chat` NDJSON | ✅ |
//! | `full` | All dialects | ❌ |
//!
//! ## Architecture
//!
//! - [`chatwire_core`] - Parts, canonical actions, counters and errors
//! - [`chatwire_streaming`] - Demuxers, part transmitter and decimator
//! - [`chatwire_dialects`] - Vendor dialect parsers and their registry
//!
//! ## Ending a Stream
//!
//! Every dispatched stream ends exactly once, with one of the
//! [`EndReason`]s. Parts closed before the end are always kept, whatever
//! the reason.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod transport;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Parts, canonical actions, counters and errors.
pub use chatwire_core as core;

/// Demuxers, part transmitter and decimator.
pub use chatwire_streaming as streaming;

/// Vendor dialect parsers.
pub use chatwire_dialects as dialects;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use config::{DispatchConfig, THROTTLE_UNITS_ENV};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use transport::{ByteStream, HttpTransport, ReqwestTransport, StreamRequest};

pub use chatwire_core::{
    ArgsFormat, CanonicalAction, ChatwireError, Counters, DialectIssue, EndReason, Part,
    PartContent, PartKind,
};
pub use chatwire_dialects::{DialectId, DialectParser, DialectRegistry};
pub use chatwire_streaming::{Decimator, DecimatorConfig, DemuxConfig, PartEvent, PartSink};

pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
///
/// ```rust
/// use chatwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CancellationToken, Counters, DialectId, DispatchConfig, DispatchError, DispatchOutcome,
        Dispatcher, EndReason, Part, PartEvent, PartSink, ReqwestTransport, StreamRequest,
    };
}
