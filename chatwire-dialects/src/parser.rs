//! The dialect parser contract.

use crate::registry::DialectId;
use chatwire_core::{CanonicalAction, Counters};
use chatwire_streaming::{Framing, WireEvent};
use std::time::{Duration, Instant};

/// Translates one vendor's wire events into canonical actions.
///
/// A parser is created per stream and owns all vendor-specific state, such
/// as the mapping from stream indices to call ids. It never fails: a frame
/// it cannot make sense of becomes an [`CanonicalAction::Issue`] followed by
/// [`CanonicalAction::ParserClose`].
pub trait DialectParser: Send {
    /// Dialect this parser speaks.
    fn dialect(&self) -> DialectId;

    /// Model the stream was requested for. Empty when unknown.
    fn model(&self) -> &str;

    /// Framing the vendor uses on the wire.
    fn framing(&self) -> Framing {
        self.dialect().framing()
    }

    /// Translate one wire event.
    fn parse(&mut self, event: &WireEvent) -> Vec<CanonicalAction>;

    /// Called once when the transport closes.
    ///
    /// Dialects that complete on transport close report
    /// [`CanonicalAction::ParserClose`] here. The default treats an early
    /// close as an issue.
    fn finish(&mut self) -> Vec<CanonicalAction> {
        vec![
            CanonicalAction::issue("stream ended before completion", Some("eof")),
            CanonicalAction::ParserClose,
        ]
    }
}

/// Latency stopwatch started when a parser is created.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    first_content: Option<Instant>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Stopwatch {
    /// Start now.
    #[must_use]
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    /// Start at a given instant.
    #[must_use]
    pub fn started_at(started: Instant) -> Self {
        Self {
            started,
            first_content: None,
        }
    }

    /// Record content at `now`. Only the first call counts.
    pub fn mark_content_at(&mut self, now: Instant) {
        self.first_content.get_or_insert(now);
    }

    /// Record content now.
    pub fn mark_content(&mut self) {
        self.mark_content_at(Instant::now());
    }

    /// Time to first content.
    #[must_use]
    pub fn time_to_first_content(&self) -> Option<Duration> {
        self.first_content
            .map(|t| t.saturating_duration_since(self.started))
    }

    /// Stamp `counters` with latency markers as of `now`.
    #[must_use]
    pub fn stamp_at(&self, counters: Counters, now: Instant) -> Counters {
        let all = now.saturating_duration_since(self.started);
        let inner = self
            .first_content
            .map(|t| now.saturating_duration_since(t));
        counters.latency(self.time_to_first_content(), inner, Some(all))
    }

    /// Stamp `counters` with latency markers as of now.
    #[must_use]
    pub fn stamp(&self, counters: Counters) -> Counters {
        self.stamp_at(counters, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_markers() {
        let t0 = Instant::now();
        let mut watch = Stopwatch::started_at(t0);
        watch.mark_content_at(t0 + Duration::from_millis(120));
        watch.mark_content_at(t0 + Duration::from_millis(500));

        let counters = watch.stamp_at(Counters::new(), t0 + Duration::from_millis(900));
        assert_eq!(counters.latency.start_ms, Some(120));
        assert_eq!(counters.latency.inner_ms, Some(780));
        assert_eq!(counters.latency.all_ms, Some(900));
    }

    #[test]
    fn test_stopwatch_without_content() {
        let t0 = Instant::now();
        let watch = Stopwatch::started_at(t0);
        let counters = watch.stamp_at(Counters::with_tokens(3, 0), t0 + Duration::from_millis(40));
        assert_eq!(counters.latency.start_ms, None);
        assert_eq!(counters.latency.inner_ms, None);
        assert_eq!(counters.latency.all_ms, Some(40));
        assert_eq!(counters.input_tokens, Some(3));
    }
}
