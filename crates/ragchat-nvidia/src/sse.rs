//! Server-Sent Events decoding for streamed chat completions

use futures::stream::{self, Stream, StreamExt};
use ragchat_core::{Error, TokenStream};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tracing::warn;

/// Incremental splitter for `text/event-stream` bodies
///
/// Bytes are buffered until a full line is available, so multi-byte characters
/// split across network chunks are decoded intact.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw bytes, returning the `data:` payloads of every completed line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.trim().is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

#[derive(Deserialize)]
struct CompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: serde_json::Value,
}

/// Meaning of one `data:` payload
#[derive(Debug, PartialEq)]
pub(crate) enum StreamEvent {
    Fragment(String),
    Done,
    Failed(String),
    Skip,
}

pub(crate) fn parse_event(payload: &str) -> StreamEvent {
    let payload = payload.trim();
    if payload == "[DONE]" {
        return StreamEvent::Done;
    }

    if let Ok(chunk) = serde_json::from_str::<CompletionChunk>(payload) {
        let text: String = chunk
            .choices
            .into_iter()
            .filter_map(|choice| choice.delta.content)
            .collect();
        return if text.is_empty() {
            StreamEvent::Skip
        } else {
            StreamEvent::Fragment(text)
        };
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(payload) {
        let message = envelope
            .error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| envelope.error.to_string());
        return StreamEvent::Failed(message);
    }

    warn!(payload, "failed to parse stream event");
    StreamEvent::Skip
}

struct StreamState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<ragchat_core::Result<String>>,
    finished: bool,
}

impl<S> StreamState<S> {
    fn absorb(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            if self.finished {
                break;
            }
            match parse_event(&payload) {
                StreamEvent::Fragment(text) => self.pending.push_back(Ok(text)),
                StreamEvent::Done => self.finished = true,
                StreamEvent::Failed(message) => {
                    self.pending.push_back(Err(Error::Generation {
                        message: format!("NVIDIA stream error: {}", message),
                        partial: String::new(),
                    }));
                    self.finished = true;
                }
                StreamEvent::Skip => {}
            }
        }
    }
}

/// Turn a raw SSE byte stream into a stream of text fragments
///
/// The resulting stream ends at `[DONE]`, at the end of the body, or right after
/// the first error.
pub(crate) fn token_stream<S, B, E>(body: S) -> TokenStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        body: Box::pin(body),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let payloads = state.decoder.push(bytes.as_ref());
                    state.absorb(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(Error::Network(format!("stream interrupted: {}", e))));
                }
                None => {
                    let trailing: Vec<String> = state.decoder.finish().into_iter().collect();
                    state.absorb(trailing);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
