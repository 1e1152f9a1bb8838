//! Newline-delimited JSON demuxing.

use crate::demux::{buffer_chunk, DemuxConfig, WireEvent};

/// Demuxer for NDJSON framing: each non-empty line is one data event.
#[derive(Debug, Default)]
pub struct NdjsonDemuxer {
    buffer: Vec<u8>,
    max_buffer_bytes: usize,
}

impl NdjsonDemuxer {
    /// Create a new demuxer with the default buffer limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&DemuxConfig::default())
    }

    /// Create a new demuxer from a config.
    #[must_use]
    pub fn with_config(config: &DemuxConfig) -> Self {
        Self {
            buffer: Vec::new(),
            max_buffer_bytes: config.max_buffer_bytes,
        }
    }

    /// Feed bytes, returning one event per completed line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<WireEvent> {
        if !buffer_chunk(&mut self.buffer, chunk, self.max_buffer_bytes) {
            return Vec::new();
        }

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            events.extend(line_event(&line));
        }
        events
    }

    /// Flush a final line that was not newline-terminated.
    pub fn flush(&mut self) -> Vec<WireEvent> {
        let tail = std::mem::take(&mut self.buffer);
        line_event(&tail).into_iter().collect()
    }
}

fn line_event(line: &[u8]) -> Option<WireEvent> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('{') {
        tracing::warn!(line, "Dropping NDJSON line that is not an object");
        return None;
    }
    Some(WireEvent::data(line))
}
