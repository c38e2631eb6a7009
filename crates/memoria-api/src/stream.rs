//! Async stream of text deltas from a streamed chat completion.

use crate::sse::SseParser;
use futures_core::Stream;
use memoria_types::ProviderError;
use pin_project_lite::pin_project;
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Data payload that terminates an OpenAI-style stream.
const DONE_MARKER: &str = "[DONE]";

type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

pin_project! {
    /// Yields the `choices[0].delta.content` fragments of a streamed
    /// completion, in order, until `[DONE]` or end of body.
    pub struct ChatStream {
        #[pin]
        inner: ByteStream,
        parser: SseParser,
        utf8_tail: Vec<u8>,
        pending: VecDeque<Result<String, ProviderError>>,
        done: bool,
    }
}

impl ChatStream {
    /// Create a ChatStream from a reqwest byte stream.
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: SseParser::new(),
            utf8_tail: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<String, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if *this.done {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => {
                    let text = decode_utf8(this.utf8_tail, &bytes);
                    for event in this.parser.feed(&text) {
                        match parse_chunk(&event.data) {
                            Chunk::Delta(text) => this.pending.push_back(Ok(text)),
                            Chunk::Empty => {}
                            Chunk::Done => {
                                *this.done = true;
                                break;
                            }
                            Chunk::Error(e) => this.pending.push_back(Err(e)),
                        }
                    }
                }
                Some(Err(e)) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(ProviderError::Network(e.to_string()))));
                }
                None => *this.done = true,
            }
        }
    }
}

/// Decode `bytes` after any incomplete UTF-8 sequence held from the last
/// chunk. A trailing partial sequence is kept for the next call.
fn decode_utf8(tail: &mut Vec<u8>, bytes: &[u8]) -> String {
    tail.extend_from_slice(bytes);
    match std::str::from_utf8(tail) {
        Ok(text) => {
            let text = text.to_string();
            tail.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let rest = tail.split_off(valid);
            let text = String::from_utf8_lossy(tail).into_owned();
            *tail = rest;
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(tail).into_owned();
            tail.clear();
            text
        }
    }
}

enum Chunk {
    Delta(String),
    Empty,
    Done,
    Error(ProviderError),
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamErrorDetail>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamErrorDetail {
    message: Option<String>,
}

fn parse_chunk(data: &str) -> Chunk {
    let data = data.trim();
    if data == DONE_MARKER {
        return Chunk::Done;
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return Chunk::Error(ProviderError::Parse(format!("stream chunk: {e}"))),
    };

    if let Some(error) = chunk.error {
        let message = error.message.unwrap_or_else(|| "unknown stream error".into());
        return Chunk::Error(ProviderError::Stream(message));
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
    {
        Some(text) if !text.is_empty() => Chunk::Delta(text),
        _ => Chunk::Empty,
    }
}
