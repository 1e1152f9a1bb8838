//! The dispatch orchestrator.
//!
//! Wires demuxer, dialect parser and part transmitter together for one
//! stream, and owns cancellation. Everything runs on the task that polls
//! the dispatch future; chunks are processed as soon as they arrive.

use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::transport::{HttpTransport, StreamRequest};
use bytes::Bytes;
use chatwire_core::{generate_stream_id, CanonicalAction, Counters, DialectIssue, EndReason, Part};
use chatwire_dialects::{DialectId, DialectParser, DialectRegistry};
use chatwire_streaming::{
    Decimator, Demuxer, PartSink, PartTransmitter, WireEvent, WireEventStream,
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::fmt::Display;
use tokio_util::sync::CancellationToken;

/// Result of one dispatched stream.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// Stream id, for log correlation.
    pub stream_id: String,
    /// Dialect the stream was parsed with.
    pub dialect: DialectId,
    /// Why the stream ended.
    pub end_reason: EndReason,
    /// Terminating issue, if any.
    pub issue: Option<DialectIssue>,
    /// Model name as reported, else as requested.
    pub model_name: Option<String>,
    /// Latest counters.
    pub counters: Option<Counters>,
    /// Closed parts in flush order.
    pub parts: Vec<Part>,
    /// When dispatch started.
    pub started_at: DateTime<Utc>,
    /// When the stream ended.
    pub finished_at: DateTime<Utc>,
}

impl DispatchOutcome {
    /// Check if the dialect completed normally.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.end_reason.is_success()
    }

    /// Concatenated text of all text parts.
    #[must_use]
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

/// Runs streams for one dialect and model.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
    registry: DialectRegistry,
}

impl Dispatcher {
    /// Create a dispatcher with every compiled-in dialect.
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_registry(config, DialectRegistry::with_defaults())
    }

    /// Create a dispatcher with a custom registry.
    pub fn with_registry(config: DispatchConfig, registry: DialectRegistry) -> Self {
        Self { config, registry }
    }

    /// Dispatch configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Open `request` on `transport` and dispatch its body.
    ///
    /// A transport failure is returned as an error before any part exists.
    /// Cancelling `cancel` while the request is in flight returns
    /// [`DispatchError::Cancelled`].
    pub async fn run<T, K>(
        &self,
        transport: &T,
        request: &StreamRequest,
        sink: K,
        cancel: CancellationToken,
    ) -> DispatchResult<DispatchOutcome>
    where
        T: HttpTransport + ?Sized,
        K: PartSink,
    {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
            opened = transport.open(request) => opened?,
        };
        self.dispatch(body, sink, cancel).await
    }

    /// Dispatch an already-open byte stream.
    ///
    /// Returns once the dialect completes, reports an issue, the transport
    /// fails, or `cancel` fires. Content committed before the end is always
    /// in the outcome.
    pub async fn dispatch<S, E, K>(
        &self,
        bytes: S,
        sink: K,
        cancel: CancellationToken,
    ) -> DispatchResult<DispatchOutcome>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
        K: PartSink,
    {
        let stream_id = generate_stream_id();
        let started_at = Utc::now();
        let mut parser = self.registry.create(self.config.dialect, &self.config.model)?;

        let demuxer = Demuxer::new(parser.framing(), &self.config.demux);
        let events = WireEventStream::new(bytes, demuxer);
        tokio::pin!(events);

        let decimator = Decimator::with_config(self.config.throttle_units, &self.config.decimator);
        let mut transmitter = PartTransmitter::new(sink, decimator);

        tracing::debug!(
            stream_id = %stream_id,
            dialect = %self.config.dialect,
            model = %self.config.model,
            throttle_units = self.config.throttle_units,
            "Dispatching stream"
        );

        while !transmitter.is_ended() {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(stream_id = %stream_id, "Stream aborted");
                    transmitter.set_aborted();
                    break;
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(WireEvent::Retry { after })) => {
                    tracing::debug!(stream_id = %stream_id, retry_after = ?after, "Ignoring retry directive");
                }
                Some(Ok(event)) => {
                    let actions = parser.parse(&event);
                    apply_all(&mut transmitter, actions);
                }
                Some(Err(err)) => {
                    tracing::warn!(stream_id = %stream_id, error = %err, "Transport failed mid-stream");
                    transmitter.set_transport_error(err.message());
                }
                None => {
                    let actions = parser.finish();
                    apply_all(&mut transmitter, actions);
                    if !transmitter.is_ended() {
                        transmitter
                            .set_dialect_terminating_issue("stream ended without completion", Some("eof"));
                    }
                }
            }
        }

        let report = transmitter.into_report();
        let end_reason = report.end_reason.unwrap_or(EndReason::Aborted);
        let model_name = report
            .model_name
            .or_else(|| requested_model(&*parser));

        tracing::info!(
            stream_id = %stream_id,
            end_reason = %end_reason,
            parts = report.parts.len(),
            "Stream finished"
        );

        Ok(DispatchOutcome {
            stream_id,
            dialect: self.config.dialect,
            end_reason,
            issue: report.issue,
            model_name,
            counters: report.counters,
            parts: report.parts,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn apply_all<K: PartSink>(
    transmitter: &mut PartTransmitter<K>,
    actions: Vec<CanonicalAction>,
) {
    for action in actions {
        if let Err(err) = transmitter.apply(action) {
            tracing::warn!(error = %err, "Dialect produced an invalid action sequence");
            transmitter.set_parser_error(&err);
            return;
        }
    }
}

fn requested_model(parser: &dyn DialectParser) -> Option<String> {
    let model = parser.model();
    (!model.is_empty()).then(|| model.to_string())
}

#[cfg(all(
    test,
    feature = "openai",
    feature = "anthropic",
    feature = "gemini",
    feature = "ollama"
))]
mod tests {
    use super::*;
    use chatwire_streaming::PartEvent;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::time::Duration;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, io::Error>> {
        let owned: Vec<Result<Bytes, io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        stream::iter(owned)
    }

    fn dispatcher(identifier: &str) -> Dispatcher {
        Dispatcher::new(
            DispatchConfig::from_model_string(identifier)
                .unwrap()
                .throttle_units(0),
        )
    }

    #[tokio::test]
    async fn test_openai_text_round_trip() {
        let body = chunks(&[
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: {\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let mut events: Vec<PartEvent> = Vec::new();
        let outcome = dispatcher("openai:gpt-4o")
            .dispatch(body, &mut events, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.end_reason, EndReason::DoneDialect);
        assert_eq!(outcome.parts.len(), 1);
        assert_eq!(outcome.parts[0].as_text(), Some("Hi there"));
        assert_eq!(outcome.model_name.as_deref(), Some("gpt-4o"));
        assert!(events.last().unwrap().is_final());
    }

    #[tokio::test]
    async fn test_args_split_across_chunks() {
        // chunk boundaries fall mid-frame
        let frames = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"sum\",\"arguments\":\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"a\\\":1\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"23}\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let bytes = frames.as_bytes();
        let pieces: Vec<&str> = vec![
            std::str::from_utf8(&bytes[..150]).unwrap(),
            std::str::from_utf8(&bytes[150..260]).unwrap(),
            std::str::from_utf8(&bytes[260..]).unwrap(),
        ];

        let outcome = dispatcher("openai:gpt-4o")
            .dispatch(chunks(&pieces), Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();

        let call = outcome.parts[0].as_function_call().unwrap();
        assert_eq!(call.call_id, "call_1");
        assert_eq!(call.args, r#"{"a":123}"#);
        assert_eq!(outcome.parts[0].parsed_args().unwrap()["a"], 123);
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_earlier_text() {
        let body = chunks(&[
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"safe\"}}]}\n\n",
            "data: {\"choices\":[{\"ind\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lost\"}}]}\n\n",
        ]);
        let outcome = dispatcher("openai:gpt-4o")
            .dispatch(body, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.end_reason, EndReason::IssueDialect);
        assert_eq!(outcome.text(), "safe");
        assert_eq!(outcome.issue.unwrap().symbol.as_deref(), Some("parse"));
    }

    #[tokio::test]
    async fn test_abort_flushes_partial_content() {
        let first = stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(
            b"event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n\n",
        ))]);
        let body = first.chain(stream::pending());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = dispatcher("anthropic:claude-sonnet-4")
            .dispatch(body, Vec::<PartEvent>::new(), cancel)
            .await
            .unwrap();

        assert_eq!(outcome.end_reason, EndReason::Aborted);
        assert_eq!(outcome.text(), "partial");
        assert!(outcome.parts[0].is_closed());
        // nothing reported a model, so the requested one is used
        assert_eq!(outcome.model_name.as_deref(), Some("claude-sonnet-4"));
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"{\"message\":{\"content\":\"half\"},\"done\":false}\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ]);
        let outcome = dispatcher("ollama:llama3.1")
            .dispatch(body, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.end_reason, EndReason::TransportError);
        assert_eq!(outcome.text(), "half");
        assert!(outcome.issue.unwrap().text.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_eof_handling_per_dialect() {
        let cut = chunks(&["data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"cut\"}}]}\n\n"]);
        let outcome = dispatcher("openai:gpt-4o")
            .dispatch(cut, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, EndReason::IssueDialect);
        assert_eq!(outcome.text(), "cut");

        // Gemini completes on transport close, even without a trailing blank line
        let gemini = chunks(&["data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}"]);
        let outcome = dispatcher("gemini:gemini-2.5-flash")
            .dispatch(gemini, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, EndReason::DoneDialect);
        assert_eq!(outcome.text(), "ok");
    }

    #[tokio::test]
    async fn test_retry_directive_ignored() {
        let body = chunks(&[
            "retry: 3000\n\n",
            "retry: 1000\ndata: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]);
        let outcome = dispatcher("openai:gpt-4o")
            .dispatch(body, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, EndReason::DoneDialect);
        assert_eq!(outcome.text(), "x");
    }

    #[tokio::test]
    async fn test_parser_error_on_orphan_fragment() {
        // an argument fragment for an index that never started is placed
        // against whatever is open, here a text part
        let body = chunks(&[
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"before\"}}\n\n",
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":3,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\"}}\n\n",
        ]);
        let outcome = dispatcher("anthropic:claude-sonnet-4")
            .dispatch(body, Vec::<PartEvent>::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, EndReason::ParserError);
        assert_eq!(outcome.text(), "before");
    }

    #[tokio::test]
    async fn test_channel_sink_receives_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let body = chunks(&[
            "{\"model\":\"llama3.1\",\"message\":{\"content\":\"yo\"},\"done\":false}\n",
            "{\"model\":\"llama3.1\",\"message\":{\"content\":\"\"},\"done\":true,\"prompt_eval_count\":3,\"eval_count\":1}\n",
        ]);
        let outcome = dispatcher("ollama:llama3.1")
            .dispatch(body, tx, CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_success());

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        assert!(matches!(received[0], PartEvent::ModelName { .. }));
        assert!(received
            .iter()
            .any(|e| matches!(e, PartEvent::Counters { counters } if counters.output_tokens == Some(1))));
        assert!(received.last().unwrap().is_final());
    }
    #[tokio::test]
    async fn test_run_over_http() {
        use crate::transport::ReqwestTransport;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "event: message_start\n",
                "data: {\"type\":\"message_start\",\"message\":{\"model\":\"claude-sonnet-4\",\"usage\":{\"input_tokens\":9}}}\n\n",
                "event: content_block_start\n",
                "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
                "event: content_block_delta\n",
                "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"hello\"}}\n\n",
                "event: content_block_stop\n",
                "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
                "event: message_stop\n",
                "data: {\"type\":\"message_stop\"}\n\n",
            )))
            .mount(&server)
            .await;

        let request = StreamRequest::new(
            format!("{}/v1/messages", server.uri()),
            serde_json::json!({"model": "claude-sonnet-4", "stream": true}),
        );
        let mut events: Vec<PartEvent> = Vec::new();
        let outcome = dispatcher("anthropic:claude-sonnet-4")
            .run(&ReqwestTransport::new(), &request, &mut events, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.end_reason, EndReason::DoneDialect);
        assert_eq!(outcome.text(), "hello");
        assert_eq!(outcome.counters.unwrap().input_tokens, Some(9));
        assert_eq!(events.iter().filter(|e| e.flushed_part().is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_status() {
        use crate::transport::ReqwestTransport;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let request = StreamRequest::new(server.uri(), serde_json::json!({}));
        let mut events: Vec<PartEvent> = Vec::new();
        let err = dispatcher("openai:gpt-4o")
            .run(&ReqwestTransport::new(), &request, &mut events, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_open() {
        use crate::transport::ReqwestTransport;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = StreamRequest::new("http://127.0.0.1:9/", serde_json::json!({}));
        let err = dispatcher("openai:gpt-4o")
            .run(&ReqwestTransport::new(), &request, Vec::<PartEvent>::new(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }
}
