//! Consumers of transmitter output.

use crate::events::PartEvent;
use chatwire_core::{Counters, DialectIssue, EndReason, Part};
use tokio::sync::mpsc::UnboundedSender;

/// Receives the outward calls of a [`PartTransmitter`](crate::PartTransmitter).
///
/// Only [`PartSink::repaint`] is subject to decimation. Everything else is
/// delivered exactly once, in order.
pub trait PartSink {
    /// A part was closed and is now immutable.
    fn part_flushed(&mut self, part: &Part);

    /// The open part changed.
    fn repaint(&mut self, _open: &Part) {}

    /// The generating model's name became known.
    fn model_name(&mut self, _name: &str) {}

    /// New counters replace any previous ones.
    fn counters(&mut self, _counters: &Counters) {}

    /// The stream ended. Called once, after the last flush.
    fn ended(&mut self, _reason: EndReason, _issue: Option<&DialectIssue>) {}
}

impl<T: PartSink + ?Sized> PartSink for &mut T {
    fn part_flushed(&mut self, part: &Part) {
        (**self).part_flushed(part);
    }

    fn repaint(&mut self, open: &Part) {
        (**self).repaint(open);
    }

    fn model_name(&mut self, name: &str) {
        (**self).model_name(name);
    }

    fn counters(&mut self, counters: &Counters) {
        (**self).counters(counters);
    }

    fn ended(&mut self, reason: EndReason, issue: Option<&DialectIssue>) {
        (**self).ended(reason, issue);
    }
}

impl<T: PartSink + ?Sized> PartSink for Box<T> {
    fn part_flushed(&mut self, part: &Part) {
        (**self).part_flushed(part);
    }

    fn repaint(&mut self, open: &Part) {
        (**self).repaint(open);
    }

    fn model_name(&mut self, name: &str) {
        (**self).model_name(name);
    }

    fn counters(&mut self, counters: &Counters) {
        (**self).counters(counters);
    }

    fn ended(&mut self, reason: EndReason, issue: Option<&DialectIssue>) {
        (**self).ended(reason, issue);
    }
}

/// Records every event, in order.
impl PartSink for Vec<PartEvent> {
    fn part_flushed(&mut self, part: &Part) {
        self.push(PartEvent::PartFlushed { part: part.clone() });
    }

    fn repaint(&mut self, open: &Part) {
        self.push(PartEvent::Repaint { part: open.clone() });
    }

    fn model_name(&mut self, name: &str) {
        self.push(PartEvent::ModelName {
            name: name.to_string(),
        });
    }

    fn counters(&mut self, counters: &Counters) {
        self.push(PartEvent::Counters {
            counters: counters.clone(),
        });
    }

    fn ended(&mut self, reason: EndReason, issue: Option<&DialectIssue>) {
        self.push(PartEvent::Ended {
            reason,
            issue: issue.cloned(),
        });
    }
}

/// Forwards events to another task, typically a UI or a store.
///
/// A closed receiver is not an error for the stream: the events are
/// dropped and the generation keeps running to completion.
impl PartSink for UnboundedSender<PartEvent> {
    fn part_flushed(&mut self, part: &Part) {
        forward(self, PartEvent::PartFlushed { part: part.clone() });
    }

    fn repaint(&mut self, open: &Part) {
        forward(self, PartEvent::Repaint { part: open.clone() });
    }

    fn model_name(&mut self, name: &str) {
        forward(
            self,
            PartEvent::ModelName {
                name: name.to_string(),
            },
        );
    }

    fn counters(&mut self, counters: &Counters) {
        forward(
            self,
            PartEvent::Counters {
                counters: counters.clone(),
            },
        );
    }

    fn ended(&mut self, reason: EndReason, issue: Option<&DialectIssue>) {
        forward(
            self,
            PartEvent::Ended {
                reason,
                issue: issue.cloned(),
            },
        );
    }
}

fn forward(tx: &UnboundedSender<PartEvent>, event: PartEvent) {
    if tx.send(event).is_err() {
        tracing::debug!("Part event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_records_in_order() {
        let mut events: Vec<PartEvent> = Vec::new();
        events.model_name("gpt-4o");
        events.ended(EndReason::Aborted, None);
        assert!(matches!(events[0], PartEvent::ModelName { .. }));
        assert!(events[1].is_final());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.counters(&Counters::with_tokens(1, 2));
        drop(tx);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PartEvent::Counters { .. }));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (mut tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.model_name("still fine");
    }
}
