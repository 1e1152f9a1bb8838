//! Splitting raw byte chunks into wire events.
//!
//! Chunks may end anywhere, including inside a UTF-8 sequence, so each
//! demuxer buffers undecoded bytes until a full frame is available.
//! Demuxers never fail: malformed frames are logged and dropped.

use crate::ndjson::NdjsonDemuxer;
use crate::sse::SseDemuxer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_MAX_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// One demuxed protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// A data frame.
    Data {
        /// Event type (event-stream `event:` field), if any.
        event_type: Option<String>,
        /// Frame payload.
        data: String,
    },
    /// A reconnect directive (event-stream `retry:` field).
    Retry {
        /// Suggested reconnection delay.
        after: Duration,
    },
}

impl WireEvent {
    /// Create a data event with no event type.
    pub fn data(data: impl Into<String>) -> Self {
        Self::Data {
            event_type: None,
            data: data.into(),
        }
    }

    /// Create a data event with an event type.
    pub fn typed(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Data {
            event_type: Some(event_type.into()),
            data: data.into(),
        }
    }

    /// Payload of a data event.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Data { data, .. } => Some(data),
            Self::Retry { .. } => None,
        }
    }

    /// Event type of a data event.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Data { event_type, .. } => event_type.as_deref(),
            Self::Retry { .. } => None,
        }
    }
}

/// Transport framing convention of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// `text/event-stream`: `field: value` lines, frames separated by a blank line.
    EventStream,
    /// Newline-delimited JSON: one object per line.
    NdJson,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::EventStream => write!(f, "event-stream"),
            Framing::NdJson => write!(f, "ndjson"),
        }
    }
}

/// Demuxer configuration.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Largest incomplete tail kept between chunks before it is discarded.
    pub max_buffer_bytes: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        }
    }
}

impl DemuxConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum buffered tail size.
    pub fn max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }
}

/// A demuxer for one of the supported framings.
#[derive(Debug)]
pub enum Demuxer {
    /// Event-stream demuxer.
    EventStream(SseDemuxer),
    /// NDJSON demuxer.
    NdJson(NdjsonDemuxer),
}

impl Demuxer {
    /// Create a demuxer for the given framing.
    pub fn new(framing: Framing, config: &DemuxConfig) -> Self {
        match framing {
            Framing::EventStream => Self::EventStream(SseDemuxer::with_config(config)),
            Framing::NdJson => Self::NdJson(NdjsonDemuxer::with_config(config)),
        }
    }

    /// Framing handled by this demuxer.
    #[must_use]
    pub fn framing(&self) -> Framing {
        match self {
            Self::EventStream(_) => Framing::EventStream,
            Self::NdJson(_) => Framing::NdJson,
        }
    }

    /// Feed a chunk, returning every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<WireEvent> {
        match self {
            Self::EventStream(d) => d.feed(chunk),
            Self::NdJson(d) => d.feed(chunk),
        }
    }

    /// Flush the trailing frame at stream end.
    pub fn flush(&mut self) -> Vec<WireEvent> {
        match self {
            Self::EventStream(d) => d.flush(),
            Self::NdJson(d) => d.flush(),
        }
    }
}

/// Append `chunk` to `buffer`, discarding everything when the limit is hit.
///
/// Returns `false` when the buffer was dropped.
pub(crate) fn buffer_chunk(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    if buffer.len() + chunk.len() > limit {
        tracing::warn!(
            buffered = buffer.len(),
            chunk = chunk.len(),
            limit,
            "Demux buffer overflow, dropping incomplete frame"
        );
        buffer.clear();
        return false;
    }
    buffer.extend_from_slice(chunk);
    true
}
