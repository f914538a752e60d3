//! Event-stream demultiplexing.
//!
//! A `text/event-stream` body is consumed by a background task that passes
//! every chunk through to the caller unchanged and, as complete lines
//! arrive, publishes them on two channels: raw text and parsed JSON.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::EVENT_CHANNEL_CAPACITY;
use crate::error_handling::FetchError;
use crate::http::BodyStream;

/// One item on an event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    /// A line split into its name (before the first colon) and data.
    Chunk {
        /// Text before the first colon.
        event: String,
        /// Text after the first colon, or its JSON value.
        data: T,
    },
    /// The body ended, failed, or consumption was cancelled. Always last.
    End,
}

/// Subscription channels attached to an event-stream response.
///
/// The channels and the pass-through body are fed by one reader task and
/// each holds at most `EVENT_CHANNEL_CAPACITY` items, so the task waits for
/// the slowest side still held. Drop whichever side you do not read; the
/// task stops pulling from the network once every side is gone.
#[derive(Debug)]
pub struct EventChannels {
    /// Every line, data as text.
    pub text: mpsc::Receiver<StreamEvent<String>>,
    /// Lines whose data parses as JSON.
    pub json: mpsc::Receiver<StreamEvent<serde_json::Value>>,
    cancel: CancellationToken,
}

impl EventChannels {
    /// Stops background consumption; both channels still receive `End`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Splits one line into `(event, data)`. Blank lines and comment lines
/// (leading colon) yield nothing; a line without a colon is an event with
/// empty data.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }
    match line.split_once(':') {
        Some((event, data)) => Some((event.trim().to_string(), data.trim().to_string())),
        None => Some((line.trim().to_string(), String::new())),
    }
}

type PassThrough = mpsc::Sender<Result<Bytes, FetchError>>;

struct Publisher {
    text: mpsc::Sender<StreamEvent<String>>,
    json: mpsc::Sender<StreamEvent<serde_json::Value>>,
    pending: Vec<u8>,
}

impl Publisher {
    async fn publish_line(&self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let Some((event, data)) = parse_line(&line) else {
            return;
        };
        // A failed send means that side was dropped; the other may still listen.
        if !self.json.is_closed() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&data) {
                let _ = self
                    .json
                    .send(StreamEvent::Chunk {
                        event: event.clone(),
                        data: value,
                    })
                    .await;
            }
        }
        let _ = self.text.send(StreamEvent::Chunk { event, data }).await;
    }

    async fn feed(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.publish_line(&line[..line.len() - 1]).await;
        }
    }

    async fn finish(mut self) {
        let rest = std::mem::take(&mut self.pending);
        if !rest.is_empty() {
            self.publish_line(&rest).await;
        }
        let _ = self.text.send(StreamEvent::End).await;
        let _ = self.json.send(StreamEvent::End).await;
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Reads one chunk and hands it to the publisher and the pass-through body.
async fn pump(
    body: &mut BodyStream,
    publisher: &mut Publisher,
    passthrough: &mut Option<PassThrough>,
) -> Flow {
    match body.next().await {
        Some(Ok(chunk)) => {
            publisher.feed(&chunk).await;
            let delivered = match passthrough.as_ref() {
                Some(tx) => tx.send(Ok(chunk)).await.is_ok(),
                None => true,
            };
            if !delivered {
                log::debug!("Event stream body dropped; publishing events only");
                *passthrough = None;
            }
            Flow::Continue
        }
        Some(Err(e)) => {
            log::debug!("Event stream ended with error: {}", e);
            if let Some(tx) = passthrough.as_ref() {
                let _ = tx.send(Err(e)).await;
            }
            Flow::Stop
        }
        None => Flow::Stop,
    }
}

/// Resolves once the body and both channels have been dropped by the caller.
async fn readers_gone(
    body: PassThrough,
    text: mpsc::Sender<StreamEvent<String>>,
    json: mpsc::Sender<StreamEvent<serde_json::Value>>,
) {
    body.closed().await;
    text.closed().await;
    json.closed().await;
}

/// Spawns the consumer task for `body`.
///
/// Returns the pass-through body for the caller and the event channels.
/// Cancelling `cancel` stops the task; the pass-through body then ends early.
pub fn demux(body: BodyStream, cancel: CancellationToken) -> (BodyStream, EventChannels) {
    let (body_tx, body_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (text_tx, text_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (json_tx, json_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let abandoned = readers_gone(body_tx.clone(), text_tx.clone(), json_tx.clone());
    let mut publisher = Publisher {
        text: text_tx,
        json: json_tx,
        pending: Vec::new(),
    };
    let token = cancel.clone();

    tokio::spawn(async move {
        let mut body = body;
        // Every body sender is gone once this block ends, so the pass-through
        // reader sees its end before the terminal events are sent.
        {
            let mut passthrough = Some(body_tx);
            tokio::pin!(abandoned);
            loop {
                let flow = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log::debug!("Event stream consumption cancelled");
                        Flow::Stop
                    }
                    _ = &mut abandoned => {
                        log::debug!("Event stream has no readers left");
                        Flow::Stop
                    }
                    flow = pump(&mut body, &mut publisher, &mut passthrough) => flow,
                };
                if flow == Flow::Stop {
                    break;
                }
            }
        }
        publisher.finish().await;
    });

    let passthrough = BodyStream::new(stream::unfold(body_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }));

    (
        passthrough,
        EventChannels {
            text: text_rx,
            json: json_rx,
            cancel,
        },
    )
}
