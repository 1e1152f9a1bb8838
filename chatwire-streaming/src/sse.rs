//! Server-Sent Events (event-stream) demuxing.
//!
//! This module splits `text/event-stream` bodies into [`WireEvent`]s and
//! provides [`WireEventStream`], an adapter from a byte stream to a stream
//! of wire events for any supported framing.

use crate::demux::{buffer_chunk, DemuxConfig, Demuxer, WireEvent};
use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Demuxer for event-stream framing.
///
/// Lines end with `\r\n`, `\n` or a lone `\r`; an empty line ends a frame.
/// Each byte is scanned once, however the body is chunked.
#[derive(Debug)]
pub struct SseDemuxer {
    buffer: Vec<u8>,
    max_buffer_bytes: usize,
    line_start: usize,
    scanned: usize,
}

impl Default for SseDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDemuxer {
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
            line_start: 0,
            scanned: 0,
        }
    }

    /// Feed bytes, returning every event completed by this chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<WireEvent> {
        if !buffer_chunk(&mut self.buffer, chunk, self.max_buffer_bytes) {
            self.line_start = 0;
            self.scanned = 0;
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut frame_start = 0;
        let mut line_start = self.line_start;
        let mut pos = self.scanned;

        while pos < self.buffer.len() {
            let terminator = match self.buffer[pos] {
                b'\n' => Some(1),
                b'\r' => match self.buffer.get(pos + 1) {
                    Some(b'\n') => Some(2),
                    Some(_) => Some(1),
                    None => None,
                },
                _ => {
                    pos += 1;
                    continue;
                }
            };

            // An empty line ends the frame, whichever terminator it has
            let empty_line = pos == line_start;
            if empty_line {
                if line_start > frame_start {
                    let frame = String::from_utf8_lossy(&self.buffer[frame_start..line_start]);
                    events.extend(parse_frame(&frame));
                }
                frame_start = line_start;
            }

            // A trailing CR may still be the first half of a CRLF
            let Some(terminator) = terminator else {
                break;
            };
            pos += terminator;
            line_start = pos;
            if empty_line {
                frame_start = pos;
            }
        }

        self.buffer.drain(..frame_start);
        self.line_start = line_start - frame_start;
        self.scanned = pos - frame_start;
        events
    }

    /// Call when the stream ends to flush a final unterminated event.
    pub fn flush(&mut self) -> Vec<WireEvent> {
        let tail = std::mem::take(&mut self.buffer);
        self.line_start = 0;
        self.scanned = 0;
        let tail = String::from_utf8_lossy(&tail);
        if tail.trim().is_empty() {
            return Vec::new();
        }
        parse_frame(&tail)
    }

    /// Number of buffered bytes not yet part of a complete event.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_frame(frame: &str) -> Vec<WireEvent> {
    let mut event_type = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut retry = None;

    for line in frame.split(['\r', '\n']) {
        if line.is_empty() || line.starts_with(':') {
            // Comment, or the gap inside a CRLF
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => event_type = Some(value.trim().to_string()),
            "data" => data_lines.push(value),
            "retry" => match value.trim().parse::<u64>() {
                Ok(ms) => retry = Some(Duration::from_millis(ms)),
                Err(_) => tracing::warn!(value, "Ignoring malformed retry field"),
            },
            "id" => {}
            _ => tracing::debug!(field, "Ignoring unknown event-stream field"),
        }
    }

    let mut events = Vec::new();
    if let Some(after) = retry {
        events.push(WireEvent::Retry { after });
    }

    if data_lines.is_empty() {
        if events.is_empty() {
            tracing::debug!(frame, "Dropping event-stream frame without data");
        }
        return events;
    }

    events.push(WireEvent::Data {
        event_type,
        data: data_lines.join("\n"),
    });
    events
}

pin_project! {
    /// Stream adapter that demuxes a byte stream into wire events.
    pub struct WireEventStream<S> {
        #[pin]
        inner: S,
        demuxer: Demuxer,
        pending: VecDeque<WireEvent>,
        finished: bool,
    }
}

impl<S> WireEventStream<S> {
    /// Create a new wire event stream over a byte stream.
    pub fn new(inner: S, demuxer: Demuxer) -> Self {
        Self {
            inner,
            demuxer,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S, E> Stream for WireEventStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    type Item = StreamResult<WireEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Return buffered events first
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.demuxer.feed(&bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(StreamError::transport(e))));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.pending.extend(this.demuxer.flush());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
