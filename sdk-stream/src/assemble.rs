//! Turning SSE frames into stream events.

use crate::classify::{EventClass, EventClassifier};
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::events::StreamEvent;
use crate::sse::ServerSentEvent;
use futures::Stream;
use pin_project_lite::pin_project;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

/// Outcome of assembling one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    /// An event for the caller.
    Event(StreamEvent),
    /// The termination sentinel was seen.
    Done,
}

/// Applies the event-assembly rules to frames.
#[derive(Debug, Clone)]
pub struct EventAssembler {
    classifier: EventClassifier,
    done_sentinel: String,
    check_error_field: bool,
}

impl Default for EventAssembler {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

impl EventAssembler {
    /// Create an assembler for a config.
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            classifier: config.classifier(),
            done_sentinel: config.done_sentinel.clone(),
            check_error_field: config.check_error_field,
        }
    }

    /// Assemble one frame.
    pub fn assemble(&self, frame: ServerSentEvent) -> StreamResult<Assembled> {
        if frame.data.starts_with(&self.done_sentinel) {
            return Ok(Assembled::Done);
        }

        let class = self.classifier.classify(frame.event.as_deref());
        if class == EventClass::Error {
            let payload = serde_json::from_str(&frame.data).unwrap_or(Value::String(frame.data));
            warn!(event = ?frame.event, "Stream received error event");
            return Err(StreamError::Event {
                event: frame.event,
                payload,
            });
        }

        let data: Value = serde_json::from_str(&frame.data)?;
        if self.check_error_field && data.get("error").is_some_and(is_truthy) {
            warn!(event = ?frame.event, "Stream payload carried an error");
            return Err(StreamError::Event {
                event: frame.event,
                payload: data,
            });
        }

        match (class, frame.event) {
            (EventClass::Named, Some(event)) => Ok(Assembled::Event(StreamEvent::Named { event, data })),
            _ => Ok(Assembled::Event(StreamEvent::Payload(data))),
        }
    }
}

/// JSON truthiness: `null`, `false`, zero and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pin_project! {
    /// Stream adapter that assembles SSE frames into stream events.
    ///
    /// Ends at the termination sentinel; frames after it are never read.
    pub struct SseEvents<S> {
        #[pin]
        frames: S,
        assembler: EventAssembler,
        done: bool,
    }
}

impl<S> SseEvents<S>
where
    S: Stream<Item = StreamResult<ServerSentEvent>>,
{
    /// Create a new event stream over a frame stream.
    pub fn new(frames: S, config: &StreamConfig) -> Self {
        Self {
            frames,
            assembler: EventAssembler::new(config),
            done: false,
        }
    }
}

impl<S> Stream for SseEvents<S>
where
    S: Stream<Item = StreamResult<ServerSentEvent>>,
{
    type Item = StreamResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match this.frames.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(frame))) => match this.assembler.assemble(frame) {
                Ok(Assembled::Event(event)) => {
                    trace!(event = ?event.event_name(), "Assembled stream event");
                    Poll::Ready(Some(Ok(event)))
                }
                Ok(Assembled::Done) => {
                    debug!("Stream reached termination sentinel");
                    *this.done = true;
                    Poll::Ready(None)
                }
                Err(error) => {
                    *this.done = true;
                    Poll::Ready(Some(Err(error)))
                }
            },
            Poll::Ready(Some(Err(error))) => {
                *this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
