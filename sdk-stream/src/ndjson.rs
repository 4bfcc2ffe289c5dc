//! Newline-delimited JSON parsing.

use crate::error::StreamResult;
use crate::events::StreamEvent;
use crate::line::LineDecoder;
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

pin_project! {
    /// Stream adapter that parses one JSON value per line of a byte stream.
    ///
    /// Blank lines are skipped. The first malformed line ends the stream.
    pub struct NdjsonEvents<S> {
        #[pin]
        inner: S,
        lines: LineDecoder,
        pending: VecDeque<String>,
        finished: bool,
    }
}

impl<S> NdjsonEvents<S>
where
    S: Stream<Item = StreamResult<Bytes>>,
{
    /// Create a new NDJSON stream over a byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lines: LineDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S> Stream for NdjsonEvents<S>
where
    S: Stream<Item = StreamResult<Bytes>>,
{
    type Item = StreamResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            while let Some(line) = this.pending.pop_front() {
                if line.is_empty() {
                    continue;
                }
                trace!(len = line.len(), "Decoded NDJSON line");
                return match serde_json::from_str(&line) {
                    Ok(value) => Poll::Ready(Some(Ok(StreamEvent::Payload(value)))),
                    Err(error) => {
                        this.pending.clear();
                        *this.finished = true;
                        Poll::Ready(Some(Err(error.into())))
                    }
                };
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.pending.extend(this.lines.decode(&bytes)),
                Poll::Ready(Some(Err(error))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.pending.extend(this.lines.flush());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
