//! Server-Sent Events (SSE) parsing.
//!
//! This module turns a chunked byte stream into complete SSE frames. Bytes
//! are first split at blank-line boundaries by the [`FrameChunker`], each
//! span is cut into lines by the [`LineDecoder`], and the lines drive the
//! [`SseDecoder`] state machine.

use crate::chunker::FrameChunker;
use crate::error::StreamResult;
use crate::line::LineDecoder;
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::Serialize;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

/// A complete SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerSentEvent {
    /// Event type, from the last `event:` line of the frame.
    pub event: Option<String>,
    /// The `data:` lines of the frame joined by `\n`.
    pub data: String,
    /// Every non-blank line that contributed to the frame, in order.
    pub raw: Vec<String>,
}

impl ServerSentEvent {
    /// Create a frame with just data.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Set the event type.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Line-driven SSE frame decoder.
///
/// Each instance owns its frame state; nothing is shared between streams.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
    raw: Vec<String>,
}

impl SseDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, returning a frame when the line completes one.
    pub fn decode(&mut self, line: &str) -> Option<ServerSentEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.finish_frame();
        }

        self.raw.push(line.to_string());

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        // Other fields (id, retry, ...) only show up in `raw`.
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }

        None
    }

    /// Finalize a frame left open at the end of the input.
    pub fn flush(&mut self) -> Option<ServerSentEvent> {
        self.finish_frame()
    }

    fn finish_frame(&mut self) -> Option<ServerSentEvent> {
        if self.event.is_none() && self.data.is_empty() {
            self.raw.clear();
            return None;
        }

        let frame = ServerSentEvent {
            event: self.event.take(),
            data: self.data.join("\n"),
            raw: std::mem::take(&mut self.raw),
        };
        self.data.clear();
        Some(frame)
    }
}

pin_project! {
    /// Stream adapter that decodes SSE frames from a byte stream.
    pub struct SseFrames<S> {
        #[pin]
        inner: S,
        chunker: FrameChunker,
        lines: LineDecoder,
        decoder: SseDecoder,
        pending: VecDeque<ServerSentEvent>,
        finished: bool,
    }
}

impl<S> SseFrames<S>
where
    S: Stream<Item = StreamResult<Bytes>>,
{
    /// Create a new frame stream over a byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            chunker: FrameChunker::new(),
            lines: LineDecoder::new(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

fn feed_lines(
    lines: impl IntoIterator<Item = String>,
    decoder: &mut SseDecoder,
    pending: &mut VecDeque<ServerSentEvent>,
) {
    for line in lines {
        if let Some(frame) = decoder.decode(&line) {
            trace!(event = ?frame.event, len = frame.data.len(), "Decoded SSE frame");
            pending.push_back(frame);
        }
    }
}

impl<S> Stream for SseFrames<S>
where
    S: Stream<Item = StreamResult<Bytes>>,
{
    type Item = StreamResult<ServerSentEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    for span in this.chunker.push(&bytes) {
                        feed_lines(this.lines.decode(&span), this.decoder, this.pending);
                    }
                }
                Poll::Ready(Some(Err(error))) => {
                    // Partial frames are dropped, not flushed.
                    *this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    *this.finished = true;

                    if let Some(rest) = this.chunker.finish() {
                        feed_lines(this.lines.decode(&rest), this.decoder, this.pending);
                    }
                    feed_lines(this.lines.flush(), this.decoder, this.pending);
                    if let Some(frame) = this.decoder.flush() {
                        this.pending.push_back(frame);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
