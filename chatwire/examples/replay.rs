//! Replay a recorded stream through the dispatcher.
//!
//! Feeds a canned OpenAI transcript in small, uneven chunks and prints the
//! events a consumer would see.
//!
//! Run with:
//! ```bash
//! RUST_LOG=chatwire=debug cargo run --example replay
//! ```

use bytes::Bytes;
use chatwire::prelude::*;
use futures::stream;
use std::time::Duration;

const TRANSCRIPT: &str = concat!(
    "data: {\"model\":\"gpt-4o-2024-08-06\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Let me check \"}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"the weather.\"}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_weather\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"\"}}]}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"city\\\":\"}}]}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"Paris\\\"}\"}}]}}]}\n\n",
    "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"tool_calls\"}],\"usage\":{\"prompt_tokens\":42,\"completion_tokens\":17}}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = DispatchConfig::from_env("openai:gpt-4o")?;
    let dispatcher = Dispatcher::new(config);

    // Cut the transcript at arbitrary offsets, like a real network would
    let chunks: Vec<Result<Bytes, std::io::Error>> = TRANSCRIPT
        .as_bytes()
        .chunks(37)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let body = stream::unfold(chunks.into_iter(), |mut chunks| async move {
        let next = chunks.next()?;
        tokio::time::sleep(Duration::from_millis(5)).await;
        Some((next, chunks))
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<PartEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                PartEvent::Repaint { part } => println!("~ repaint {}", part.kind()),
                PartEvent::PartFlushed { part } => println!("+ flushed {:?}", part.content()),
                PartEvent::ModelName { name } => println!("= model {}", name),
                PartEvent::Counters { counters } => println!(
                    "= tokens in={:?} out={:?}",
                    counters.input_tokens, counters.output_tokens
                ),
                PartEvent::Ended { reason, issue } => println!("# ended {} {:?}", reason, issue),
            }
        }
    });

    let outcome = dispatcher
        .dispatch(body, tx, CancellationToken::new())
        .await?;
    printer.await?;

    println!();
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
