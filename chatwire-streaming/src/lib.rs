//! # chatwire-streaming
//!
//! Streaming machinery for chatwire.
//!
//! This crate turns raw response bytes into wire events and canonical
//! actions into an ordered log of closed parts, while bounding how often a
//! consumer is asked to repaint.
//!
//! ## Core Concepts
//!
//! - **[`Demuxer`]**: Split byte chunks into [`WireEvent`]s (event-stream or NDJSON)
//! - **[`WireEventStream`]**: Async stream adapter over a byte stream
//! - **[`PartTransmitter`]**: State machine holding at most one open part
//! - **[`Decimator`]**: Rate limiter for repaint notifications
//! - **[`PartSink`]**: Consumer of transmitter output
//!
//! ## Example - Demuxing
//!
//! ```rust
//! use chatwire_streaming::{Demuxer, DemuxConfig, Framing, WireEvent};
//!
//! let mut demuxer = Demuxer::new(Framing::EventStream, &DemuxConfig::default());
//! assert!(demuxer.feed(b"data: {\"a\"").is_empty());
//! assert_eq!(demuxer.feed(b":1}\n\n"), vec![WireEvent::data("{\"a\":1}")]);
//! ```
//!
//! ## Example - Transmitting
//!
//! ```rust
//! use chatwire_core::CanonicalAction;
//! use chatwire_streaming::{Decimator, PartEvent, PartTransmitter};
//!
//! let mut events: Vec<PartEvent> = Vec::new();
//! let mut tx = PartTransmitter::new(&mut events, Decimator::new(1));
//! tx.apply(CanonicalAction::text("Hello")).unwrap();
//! tx.apply(CanonicalAction::ParserClose).unwrap();
//! drop(tx);
//!
//! assert!(events.last().unwrap().is_final());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decimator;
pub mod demux;
pub mod error;
pub mod events;
pub mod ndjson;
pub mod sink;
pub mod sse;
pub mod transmitter;

// Re-exports
pub use decimator::{Decimator, DecimatorConfig};
pub use demux::{DemuxConfig, Demuxer, Framing, WireEvent};
pub use error::{StreamError, StreamResult};
pub use events::PartEvent;
pub use ndjson::NdjsonDemuxer;
pub use sink::PartSink;
pub use sse::{SseDemuxer, WireEventStream};
pub use transmitter::{PartTransmitter, TransmitterReport, TransmitterState};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Decimator, DecimatorConfig, DemuxConfig, Demuxer, Framing, PartEvent, PartSink,
        PartTransmitter, StreamError, StreamResult, WireEvent, WireEventStream,
    };
}
