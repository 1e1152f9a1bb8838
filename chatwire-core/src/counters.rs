//! Token and latency counters for a single generation.
//!
//! Counters are stream-scoped. A dialect may report them more than once
//! (an early estimate, then the final figures); the latest report replaces
//! the previous one wholesale.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency markers, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latency {
    /// Time from stream start to the first generated content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    /// Time spent generating after the first content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_ms: Option<u64>,
    /// Total time from stream start to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_ms: Option<u64>,
}

impl Latency {
    /// Check if no marker is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_ms.is_none() && self.inner_ms.is_none() && self.all_ms.is_none()
    }
}

/// Token counts plus latency for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Prompt tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    /// Generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    /// Prompt tokens served from cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    /// Prompt tokens written to cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
    /// Latency markers.
    #[serde(default, skip_serializing_if = "Latency::is_empty")]
    pub latency: Latency,
}

impl Counters {
    /// Create a new empty counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counters with input and output tokens.
    #[must_use]
    pub fn with_tokens(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            ..Self::default()
        }
    }

    /// Set input tokens.
    #[must_use]
    pub fn input_tokens(mut self, tokens: u64) -> Self {
        self.input_tokens = Some(tokens);
        self
    }

    /// Set output tokens.
    #[must_use]
    pub fn output_tokens(mut self, tokens: u64) -> Self {
        self.output_tokens = Some(tokens);
        self
    }

    /// Set cache read tokens.
    #[must_use]
    pub fn cache_read_tokens(mut self, tokens: u64) -> Self {
        self.cache_read_tokens = Some(tokens);
        self
    }

    /// Set cache write tokens.
    #[must_use]
    pub fn cache_write_tokens(mut self, tokens: u64) -> Self {
        self.cache_write_tokens = Some(tokens);
        self
    }

    /// Set latency markers from durations.
    #[must_use]
    pub fn latency(
        mut self,
        start: Option<Duration>,
        inner: Option<Duration>,
        all: Option<Duration>,
    ) -> Self {
        self.latency = Latency {
            start_ms: start.map(duration_ms),
            inner_ms: inner.map(duration_ms),
            all_ms: all.map(duration_ms),
        };
        self
    }

    /// Total tokens, when both sides are known.
    #[must_use]
    pub fn total_tokens(&self) -> Option<u64> {
        match (self.input_tokens, self.output_tokens) {
            (Some(i), Some(o)) => Some(i.saturating_add(o)),
            _ => None,
        }
    }

    /// Fold a partial report into this one, keeping fields the report omits.
    ///
    /// Dialects that spread usage over several frames use this to build the
    /// full snapshot they emit; the transmitter itself never merges.
    pub fn update_from(&mut self, other: &Counters) {
        self.input_tokens = other.input_tokens.or(self.input_tokens);
        self.output_tokens = other.output_tokens.or(self.output_tokens);
        self.cache_read_tokens = other.cache_read_tokens.or(self.cache_read_tokens);
        self.cache_write_tokens = other.cache_write_tokens.or(self.cache_write_tokens);
        self.latency = Latency {
            start_ms: other.latency.start_ms.or(self.latency.start_ms),
            inner_ms: other.latency.inner_ms.or(self.latency.inner_ms),
            all_ms: other.latency.all_ms.or(self.latency.all_ms),
        };
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_total_tokens() {
        assert_eq!(Counters::with_tokens(10, 5).total_tokens(), Some(15));
        assert_eq!(Counters::new().input_tokens(3).total_tokens(), None);
        assert_eq!(Counters::with_tokens(u64::MAX, 1).total_tokens(), Some(u64::MAX));
    }

    #[test]
    fn test_update_from_keeps_missing_fields() {
        let mut counters = Counters::new().input_tokens(120).cache_read_tokens(100);
        counters.update_from(&Counters::new().output_tokens(42));

        assert_eq!(
            counters,
            Counters {
                input_tokens: Some(120),
                output_tokens: Some(42),
                cache_read_tokens: Some(100),
                cache_write_tokens: None,
                latency: Latency::default(),
            }
        );
    }

    #[test]
    fn test_latency_in_ms() {
        let counters = Counters::new().latency(
            Some(Duration::from_millis(250)),
            Some(Duration::from_millis(750)),
            Some(Duration::from_secs(1)),
        );
        assert_eq!(counters.latency.start_ms, Some(250));
        assert_eq!(counters.latency.all_ms, Some(1000));
    }

    #[test]
    fn test_serde_skips_empty() {
        let json = serde_json::to_value(Counters::with_tokens(1, 2)).unwrap();
        assert!(json.get("latency").is_none());
        assert!(json.get("cache_read_tokens").is_none());
    }
}
