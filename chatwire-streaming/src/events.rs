//! Outward events of a part transmitter.
//!
//! [`PartEvent`] is the serializable form of everything a consumer hears
//! about one stream: repaints of the open part, flushed parts, and the
//! stream-scoped model name, counters and end reason.

use chatwire_core::{Counters, DialectIssue, EndReason, Part};
use serde::{Deserialize, Serialize};

/// Events emitted by a transmitter to its consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartEvent {
    /// Snapshot of the open part. May be decimated.
    Repaint {
        /// The open part as it stands.
        part: Part,
    },

    /// A part was closed. Never decimated; each part appears exactly once.
    PartFlushed {
        /// The closed, immutable part.
        part: Part,
    },

    /// The generating model's name.
    ModelName {
        /// Model name.
        name: String,
    },

    /// Latest counters. Replaces any earlier counters.
    Counters {
        /// Counter snapshot.
        counters: Counters,
    },

    /// The stream ended.
    Ended {
        /// Why it ended.
        reason: EndReason,
        /// Terminating issue, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        issue: Option<DialectIssue>,
    },
}

impl PartEvent {
    /// Check if this is the final event of a stream.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }

    /// Flushed part carried by this event, if any.
    #[must_use]
    pub fn flushed_part(&self) -> Option<&Part> {
        match self {
            Self::PartFlushed { part } => Some(part),
            _ => None,
        }
    }
}
