//! Part transmitter: the state machine between dialect actions and consumers.
//!
//! The transmitter turns [`CanonicalAction`]s into an ordered log of closed
//! [`Part`]s. It holds at most one open part at any time; every opened part
//! is flushed exactly once, and content of two parts is never interleaved.
//!
//! # Example
//!
//! ```rust
//! use chatwire_core::{CanonicalAction, EndReason};
//! use chatwire_streaming::{Decimator, PartEvent, PartTransmitter};
//!
//! let mut events: Vec<PartEvent> = Vec::new();
//! let mut tx = PartTransmitter::new(&mut events, Decimator::disabled());
//!
//! tx.apply(CanonicalAction::text("Hi")).unwrap();
//! tx.apply(CanonicalAction::text(" there")).unwrap();
//! tx.apply(CanonicalAction::ParserClose).unwrap();
//!
//! let report = tx.into_report();
//! assert_eq!(report.end_reason, Some(EndReason::DoneDialect));
//! assert_eq!(report.parts[0].as_text(), Some("Hi there"));
//! ```

use crate::decimator::Decimator;
use crate::sink::PartSink;
use chatwire_core::{
    generate_tool_call_id, ArgsFormat, CanonicalAction, Counters, DialectIssue, EndReason,
    InvalidActionSequence, Part, PartContent,
};

/// Observable state of a transmitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitterState {
    /// No part is open.
    Idle,
    /// A text part is open.
    TextOpen,
    /// A function call part is open.
    FunctionCallOpen(String),
    /// A code execution request part is open.
    CodeExecRequestOpen,
    /// A code execution response part is open.
    CodeExecResponseOpen,
}

/// Everything a transmitter committed, taken at the end of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmitterReport {
    /// Closed parts in flush order.
    pub parts: Vec<Part>,
    /// End reason, `None` if the stream was never ended.
    pub end_reason: Option<EndReason>,
    /// Terminating issue, if any.
    pub issue: Option<DialectIssue>,
    /// Model name, if reported.
    pub model_name: Option<String>,
    /// Latest counters, if reported.
    pub counters: Option<Counters>,
}

/// State machine that assembles parts and notifies a [`PartSink`].
#[derive(Debug)]
pub struct PartTransmitter<S: PartSink> {
    sink: S,
    decimator: Decimator,
    open: Option<Part>,
    flushed: Vec<Part>,
    model_name: Option<String>,
    counters: Option<Counters>,
    counter_reports: u32,
    end_reason: Option<EndReason>,
    issue: Option<DialectIssue>,
    last_code_exec_call_id: Option<String>,
}

impl<S: PartSink> PartTransmitter<S> {
    /// Create a transmitter notifying `sink`, with repaints behind `decimator`.
    pub fn new(sink: S, decimator: Decimator) -> Self {
        Self {
            sink,
            decimator,
            open: None,
            flushed: Vec::new(),
            model_name: None,
            counters: None,
            counter_reports: 0,
            end_reason: None,
            issue: None,
            last_code_exec_call_id: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TransmitterState {
        match self.open.as_ref().map(Part::content) {
            None => TransmitterState::Idle,
            Some(PartContent::Text { .. }) => TransmitterState::TextOpen,
            Some(PartContent::FunctionCall(call)) => {
                TransmitterState::FunctionCallOpen(call.call_id.clone())
            }
            Some(PartContent::CodeExecRequest(_)) => TransmitterState::CodeExecRequestOpen,
            Some(PartContent::CodeExecResponse(_)) => TransmitterState::CodeExecResponseOpen,
        }
    }

    /// The open part, if any.
    #[must_use]
    pub fn open_part(&self) -> Option<&Part> {
        self.open.as_ref()
    }

    /// Parts flushed so far, in order.
    #[must_use]
    pub fn flushed_parts(&self) -> &[Part] {
        &self.flushed
    }

    /// Check if the stream has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    /// End reason, once ended.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Reported model name.
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    /// Latest counters.
    #[must_use]
    pub fn counters(&self) -> Option<&Counters> {
        self.counters.as_ref()
    }

    /// Repaint decimator.
    #[must_use]
    pub fn decimator(&self) -> &Decimator {
        &self.decimator
    }

    /// The sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply one canonical action.
    ///
    /// Fails only when the action cannot be placed, e.g. an argument
    /// fragment with no matching open function call. Actions after the
    /// stream ended are ignored.
    pub fn apply(&mut self, action: CanonicalAction) -> Result<(), InvalidActionSequence> {
        if self.is_ended() {
            tracing::debug!(action = action.kind(), "Ignoring action after stream end");
            return Ok(());
        }

        match action {
            CanonicalAction::Text { delta } => self.append_text(&delta),
            CanonicalAction::FunctionCallStart {
                id,
                name,
                args_format,
                args,
            } => {
                self.start_function_tool_call(id, &name, args_format, args.as_deref());
            }
            CanonicalAction::FunctionCallArgsAppend { id, chunk } => {
                self.append_function_tool_call_args(id.as_deref(), &chunk)?;
            }
            CanonicalAction::CodeExecCall { id, language, code } => {
                self.add_code_execution_tool_call(id, &language, &code);
            }
            CanonicalAction::CodeExecResponse { id, output, error } => {
                self.add_code_execution_response(id, &output, error);
            }
            CanonicalAction::EndPart => self.end_message_part(),
            CanonicalAction::SetModelName { name } => self.set_model_name(name),
            CanonicalAction::SetCounters { counters } => self.set_counters(counters),
            CanonicalAction::Issue { issue } => self.terminate(EndReason::IssueDialect, Some(issue)),
            CanonicalAction::ParserClose => self.terminate(EndReason::DoneDialect, None),
        }
        Ok(())
    }

    /// Append text, opening a new text part unless one is already open.
    pub fn append_text(&mut self, text: &str) {
        if self.is_ended() || text.is_empty() {
            return;
        }

        let text_open = self
            .open
            .as_ref()
            .is_some_and(|part| part.as_text().is_some());
        if !text_open {
            self.flush_open();
            self.open = Some(Part::text(text));
        } else if let Some(part) = self.open.as_mut() {
            if let Err(e) = part.append_text(text) {
                tracing::warn!(error = %e, "Text append rejected");
                return;
            }
        }
        self.repaint();
    }

    /// Close any open part and open a function call.
    ///
    /// Returns the call id, synthesized when the dialect supplies none, or
    /// `None` if the stream already ended.
    pub fn start_function_tool_call(
        &mut self,
        id: Option<String>,
        name: &str,
        args_format: ArgsFormat,
        args: Option<&str>,
    ) -> Option<String> {
        if self.is_ended() {
            return None;
        }

        self.flush_open();
        let call_id = id.unwrap_or_else(generate_tool_call_id);
        self.open = Some(Part::function_call(
            call_id.clone(),
            name,
            args_format,
            args.unwrap_or_default(),
        ));
        self.repaint();
        Some(call_id)
    }

    /// Append an argument fragment to the open function call.
    ///
    /// With an `id`, the open call must carry that id. Without one, the open
    /// part just has to be a function call.
    pub fn append_function_tool_call_args(
        &mut self,
        id: Option<&str>,
        chunk: &str,
    ) -> Result<(), InvalidActionSequence> {
        if self.is_ended() {
            return Ok(());
        }

        let Some(part) = self.open.as_mut() else {
            return Err(no_open_call(id));
        };
        let Some(open_id) = part.as_function_call().map(|c| c.call_id.as_str()) else {
            return Err(no_open_call(id));
        };
        if let Some(id) = id {
            if id != open_id {
                return Err(InvalidActionSequence::new(format!(
                    "argument fragment does not belong to open call {}",
                    open_id
                ))
                .with_call_id(id));
            }
        }

        part.append_args(chunk)?;
        self.repaint();
        Ok(())
    }

    /// Record a complete code execution request as its own closed part.
    ///
    /// Returns the call id, synthesized when the dialect supplies none.
    pub fn add_code_execution_tool_call(
        &mut self,
        id: Option<String>,
        language: &str,
        code: &str,
    ) -> Option<String> {
        if self.is_ended() {
            return None;
        }

        self.flush_open();
        let call_id = id.unwrap_or_else(generate_tool_call_id);
        self.open = Some(Part::code_exec_request(call_id.clone(), language, code));
        self.flush_open();
        self.last_code_exec_call_id = Some(call_id.clone());
        Some(call_id)
    }

    /// Record a complete code execution result as its own closed part.
    ///
    /// Without an `id` the result answers the most recent request.
    pub fn add_code_execution_response(
        &mut self,
        id: Option<String>,
        output: &str,
        error: Option<String>,
    ) {
        if self.is_ended() {
            return;
        }

        self.flush_open();
        let call_id = id
            .or_else(|| self.last_code_exec_call_id.clone())
            .unwrap_or_else(generate_tool_call_id);
        self.open = Some(Part::code_exec_response(call_id, output, error));
        self.flush_open();
    }

    /// Close and flush the open part. No-op when idle.
    pub fn end_message_part(&mut self) {
        self.flush_open();
    }

    /// End the stream on behalf of a dialect.
    ///
    /// Only `DoneDialect` and `IssueDialect` are accepted here; the other
    /// reasons have dedicated entry points owned by the orchestrator.
    pub fn set_ended(&mut self, reason: EndReason) -> Result<(), InvalidActionSequence> {
        if !reason.is_dialect_reason() {
            return Err(InvalidActionSequence::new(format!(
                "{} cannot be set by a dialect",
                reason
            )));
        }
        self.terminate(reason, None);
        Ok(())
    }

    /// End the stream with a human-readable dialect issue.
    pub fn set_dialect_terminating_issue(&mut self, text: impl Into<String>, symbol: Option<&str>) {
        let mut issue = DialectIssue::new(text);
        if let Some(symbol) = symbol {
            issue = issue.with_symbol(symbol);
        }
        self.terminate(EndReason::IssueDialect, Some(issue));
    }

    /// End the stream because the caller aborted it.
    pub fn set_aborted(&mut self) {
        self.terminate(EndReason::Aborted, None);
    }

    /// End the stream because the byte source failed mid-stream.
    pub fn set_transport_error(&mut self, message: impl Into<String>) {
        self.terminate(
            EndReason::TransportError,
            Some(DialectIssue::new(message).with_symbol("transport")),
        );
    }

    /// End the stream because the dialect produced an unplaceable action.
    pub fn set_parser_error(&mut self, error: &InvalidActionSequence) {
        self.terminate(
            EndReason::ParserError,
            Some(DialectIssue::new(error.to_string()).with_symbol("parser")),
        );
    }

    /// Record the model name.
    pub fn set_model_name(&mut self, name: impl Into<String>) {
        if self.is_ended() {
            return;
        }
        let name = name.into();
        self.sink.model_name(&name);
        self.model_name = Some(name);
    }

    /// Record counters, replacing any earlier report.
    pub fn set_counters(&mut self, counters: Counters) {
        if self.is_ended() {
            return;
        }
        self.counter_reports += 1;
        if self.counter_reports > 2 {
            tracing::debug!(reports = self.counter_reports, "Counters reported again");
        }
        self.sink.counters(&counters);
        self.counters = Some(counters);
    }

    /// Take the committed output. Any still-open part is left out.
    pub fn into_report(self) -> TransmitterReport {
        TransmitterReport {
            parts: self.flushed,
            end_reason: self.end_reason,
            issue: self.issue,
            model_name: self.model_name,
            counters: self.counters,
        }
    }

    fn terminate(&mut self, reason: EndReason, issue: Option<DialectIssue>) {
        if let Some(previous) = self.end_reason {
            tracing::debug!(%previous, ignored = %reason, "Stream already ended");
            return;
        }

        self.flush_open();
        if let Some(ref issue) = issue {
            tracing::warn!(end_reason = %reason, issue = %issue, "Stream ended with issue");
        } else {
            tracing::debug!(end_reason = %reason, parts = self.flushed.len(), "Stream ended");
        }
        self.end_reason = Some(reason);
        self.issue = issue;
        self.sink.ended(reason, self.issue.as_ref());
    }

    fn flush_open(&mut self) {
        let Some(mut part) = self.open.take() else {
            return;
        };
        part.close();
        let sink = &mut self.sink;
        self.decimator.call_always(|| sink.part_flushed(&part));
        self.flushed.push(part);
    }

    fn repaint(&mut self) {
        let Some(part) = self.open.as_ref() else {
            return;
        };
        let sink = &mut self.sink;
        self.decimator.call(|| sink.repaint(part));
    }
}

fn no_open_call(id: Option<&str>) -> InvalidActionSequence {
    let err = InvalidActionSequence::new("argument fragment without an open function call");
    match id {
        Some(id) => err.with_call_id(id),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimator::DecimatorConfig;
    use crate::events::PartEvent;
    use chatwire_core::{PartKind, PartState};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn transmitter(events: &mut Vec<PartEvent>) -> PartTransmitter<&mut Vec<PartEvent>> {
        PartTransmitter::new(events, Decimator::disabled())
    }

    fn flushed(events: &[PartEvent]) -> Vec<&Part> {
        events.iter().filter_map(PartEvent::flushed_part).collect()
    }

    #[test]
    fn test_text_accumulates_into_one_part() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("Hi");
        tx.append_text(" there");
        assert_eq!(tx.state(), TransmitterState::TextOpen);
        tx.set_ended(EndReason::DoneDialect).unwrap();
        assert_eq!(tx.state(), TransmitterState::Idle);
        drop(tx);

        let parts = flushed(&events);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].as_text(), Some("Hi there"));
        assert_eq!(parts[0].state(), PartState::Closed);
        assert!(matches!(
            events.last(),
            Some(PartEvent::Ended {
                reason: EndReason::DoneDialect,
                issue: None
            })
        ));
    }

    #[test]
    fn test_at_most_one_open_part() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);

        tx.append_text("a");
        let call = tx
            .start_function_tool_call(Some("c1".into()), "f", ArgsFormat::IncrementalJson, None)
            .unwrap();
        tx.append_function_tool_call_args(Some(&call), "{}").unwrap();
        tx.append_text("b");
        tx.add_code_execution_tool_call(None, "python", "print(1)");
        tx.add_code_execution_response(None, "1\n", None);
        tx.append_text("c");
        tx.end_message_part();
        drop(tx);

        // a flush happens before every open, so there is never a second open part
        let mut open: Option<&Part> = None;
        for event in &events {
            match event {
                PartEvent::Repaint { part } => {
                    if let Some(current) = open {
                        assert_eq!(current.id(), part.id(), "two parts open at once");
                    }
                    open = Some(part);
                }
                PartEvent::PartFlushed { part } => {
                    if let Some(current) = open {
                        assert_eq!(current.id(), part.id());
                    }
                    open = None;
                }
                _ => {}
            }
        }

        let kinds: Vec<PartKind> = flushed(&events).iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                PartKind::Text,
                PartKind::FunctionCall,
                PartKind::Text,
                PartKind::CodeExecRequest,
                PartKind::CodeExecResponse,
                PartKind::Text,
            ]
        );
    }

    fn action(op: usize) -> CanonicalAction {
        match op {
            0 => CanonicalAction::text("t"),
            1 => CanonicalAction::function_call_start(None, "f"),
            2 => CanonicalAction::args_append(None, "{}"),
            3 => CanonicalAction::CodeExecCall {
                id: None,
                language: "python".into(),
                code: "1".into(),
            },
            4 => CanonicalAction::CodeExecResponse {
                id: None,
                output: "1".into(),
                error: None,
            },
            _ => CanonicalAction::EndPart,
        }
    }

    #[test]
    fn test_single_open_part_for_every_interleaving() {
        const OPS: usize = 6;
        const LEN: u32 = 4;

        for seq in 0..OPS.pow(LEN) {
            let ops: Vec<usize> = (0..LEN).map(|i| seq / OPS.pow(i) % OPS).collect();
            let mut events = Vec::new();
            let mut tx = transmitter(&mut events);
            for &op in &ops {
                // args with no open call are rejected without side effects
                let _ = tx.apply(action(op));
                assert!(tx.open_part().map_or(true, |p| !p.is_closed()), "{:?}", ops);
            }
            tx.set_ended(EndReason::DoneDialect).unwrap();
            drop(tx);

            let mut open: Option<&Part> = None;
            let mut seen = std::collections::HashSet::new();
            for event in &events {
                match event {
                    PartEvent::Repaint { part } => {
                        if let Some(current) = open {
                            assert_eq!(current.id(), part.id(), "two parts open: {:?}", ops);
                        }
                        assert!(!seen.contains(part.id()), "repaint after flush: {:?}", ops);
                        open = Some(part);
                    }
                    PartEvent::PartFlushed { part } => {
                        if let Some(current) = open {
                            assert_eq!(current.id(), part.id(), "{:?}", ops);
                        }
                        assert!(seen.insert(part.id().clone()), "flushed twice: {:?}", ops);
                        open = None;
                    }
                    _ => {}
                }
            }
            assert!(open.is_none(), "{:?}", ops);

            for part in flushed(&events) {
                if let Some(text) = part.as_text() {
                    assert!(text.chars().all(|c| c == 't'), "{:?}", ops);
                }
                if let Some(call) = part.as_function_call() {
                    assert_eq!(call.args, "{}".repeat(call.args.len() / 2), "{:?}", ops);
                }
            }
        }
    }

    #[test]
    fn test_every_part_flushed_once() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("x");
        tx.start_function_tool_call(None, "g", ArgsFormat::IncrementalJson, None);
        tx.append_text("y");
        tx.set_ended(EndReason::DoneDialect).unwrap();
        drop(tx);

        let parts = flushed(&events);
        let mut ids: Vec<_> = parts.iter().map(|p| p.id().clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_end_message_part_idempotent() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("once");
        tx.end_message_part();
        tx.end_message_part();
        assert_eq!(tx.state(), TransmitterState::Idle);
        drop(tx);

        assert_eq!(flushed(&events).len(), 1);
    }

    #[test]
    fn test_end_message_part_when_idle() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.end_message_part();
        drop(tx);
        assert!(events.is_empty());
    }

    #[test]
    fn test_args_reconstructed_verbatim() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.apply(CanonicalAction::function_call_start(
            Some("call_1".into()),
            "sum",
        ))
        .unwrap();
        tx.apply(CanonicalAction::args_append(Some("call_1".into()), r#"{"a":1"#))
            .unwrap();
        tx.apply(CanonicalAction::args_append(Some("call_1".into()), "23}"))
            .unwrap();
        tx.apply(CanonicalAction::ParserClose).unwrap();

        let report = tx.into_report();
        let call = report.parts[0].as_function_call().unwrap();
        assert_eq!(call.args, r#"{"a":123}"#);
        assert_eq!(call.name, "sum");
        assert_eq!(report.parts[0].parsed_args().unwrap()["a"], 123);
    }

    #[test]
    fn test_args_without_ids_use_sole_open_call() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        let call_id = tx
            .start_function_tool_call(None, "lookup", ArgsFormat::IncrementalJson, Some("{"))
            .unwrap();
        assert!(call_id.starts_with("call_"));
        assert_eq!(tx.state(), TransmitterState::FunctionCallOpen(call_id));

        tx.append_function_tool_call_args(None, "}").unwrap();
        tx.end_message_part();
        let report = tx.into_report();
        assert_eq!(report.parts[0].as_function_call().unwrap().args, "{}");
    }

    #[test]
    fn test_args_for_wrong_call_rejected() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);

        assert!(tx.append_function_tool_call_args(None, "{").is_err());

        tx.start_function_tool_call(Some("a".into()), "f", ArgsFormat::IncrementalJson, None);
        let err = tx
            .append_function_tool_call_args(Some("b"), "{")
            .unwrap_err();
        assert_eq!(err.call_id.as_deref(), Some("b"));

        tx.append_text("text closes the call");
        assert!(tx.append_function_tool_call_args(Some("a"), "}").is_err());
    }

    #[test]
    fn test_parser_error_keeps_flushed_parts() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("kept");
        let err = tx
            .apply(CanonicalAction::args_append(None, "{"))
            .unwrap_err();
        tx.set_parser_error(&err);

        let report = tx.into_report();
        assert_eq!(report.end_reason, Some(EndReason::ParserError));
        assert_eq!(report.parts.len(), 1);
        assert_eq!(report.parts[0].as_text(), Some("kept"));
    }

    #[test]
    fn test_code_exec_parts_are_atomic() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("running");
        let call_id = tx
            .add_code_execution_tool_call(None, "python", "print(2+2)")
            .unwrap();
        assert_eq!(tx.state(), TransmitterState::Idle);
        tx.add_code_execution_response(None, "4\n", None);
        assert_eq!(tx.state(), TransmitterState::Idle);

        let report = tx.into_report();
        assert_eq!(report.parts.len(), 3);
        assert_eq!(report.parts[1].call_id(), Some(call_id.as_str()));
        assert_eq!(report.parts[2].call_id(), Some(call_id.as_str()));
        assert!(report.parts.iter().all(Part::is_closed));
    }

    #[test]
    fn test_issue_flushes_then_ends() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.append_text("partial");
        tx.apply(CanonicalAction::issue("overloaded", Some("529")))
            .unwrap();
        tx.apply(CanonicalAction::ParserClose).unwrap();
        tx.append_text("ignored");
        drop(tx);

        assert_eq!(flushed(&events)[0].as_text(), Some("partial"));
        let ends: Vec<_> = events.iter().filter(|e| e.is_final()).collect();
        assert_eq!(ends.len(), 1);
        match ends[0] {
            PartEvent::Ended { reason, issue } => {
                assert_eq!(*reason, EndReason::IssueDialect);
                assert_eq!(issue.as_ref().unwrap().text, "overloaded");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dialect_cannot_set_orchestrator_reasons() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        assert!(tx.set_ended(EndReason::Aborted).is_err());
        assert!(tx.set_ended(EndReason::TransportError).is_err());
        assert!(!tx.is_ended());

        tx.set_aborted();
        assert_eq!(tx.end_reason(), Some(EndReason::Aborted));
    }

    #[test]
    fn test_abort_flushes_partial_content() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.start_function_tool_call(Some("c".into()), "f", ArgsFormat::IncrementalJson, None);
        tx.append_function_tool_call_args(Some("c"), r#"{"half":"#)
            .unwrap();
        tx.set_aborted();

        let report = tx.into_report();
        assert_eq!(report.end_reason, Some(EndReason::Aborted));
        assert_eq!(
            report.parts[0].as_function_call().unwrap().args,
            r#"{"half":"#
        );
    }

    #[test]
    fn test_counters_last_write_wins() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        tx.set_model_name("claude-sonnet-4");
        tx.set_counters(Counters::with_tokens(10, 1));
        tx.set_counters(Counters::with_tokens(10, 250));

        assert_eq!(tx.model_name(), Some("claude-sonnet-4"));
        assert_eq!(tx.counters().unwrap().output_tokens, Some(250));
    }

    #[test]
    fn test_repaints_decimated_but_state_accumulates() {
        let config = DecimatorConfig::new()
            .base_interval(Duration::from_secs(60))
            .free_passes(2);
        let mut events = Vec::new();
        let mut tx = PartTransmitter::new(&mut events, Decimator::with_config(1, &config));

        for _ in 0..10 {
            tx.append_text("x");
        }
        tx.end_message_part();
        drop(tx);

        let repaints = events
            .iter()
            .filter(|e| matches!(e, PartEvent::Repaint { .. }))
            .count();
        assert_eq!(repaints, 3);
        assert_eq!(flushed(&events)[0].as_text(), Some("xxxxxxxxxx"));
    }

    #[test]
    fn test_repaint_count_matches_calls_when_disabled() {
        let mut events = Vec::new();
        let mut tx = transmitter(&mut events);
        for _ in 0..25 {
            tx.append_text("y");
        }
        assert_eq!(tx.decimator().passed(), 25);
        drop(tx);

        let repaints = events
            .iter()
            .filter(|e| matches!(e, PartEvent::Repaint { .. }))
            .count();
        assert_eq!(repaints, 25);
    }
}
