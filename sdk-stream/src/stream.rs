//! Single-consumption event streams.
//!
//! An [`EventStream`] wraps a producer built by the factories and hands it
//! out exactly once through [`EventStream::iterate`]. The returned
//! [`EventIter`] is a plain [`Stream`]; dropping it before the producer is
//! exhausted cancels the underlying byte source.

use crate::error::{BoxError, StreamError, StreamResult};
use crate::events::StreamEvent;
use bytes::Bytes;
use futures::{Future, Stream, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

/// Lifecycle of an event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Not pulled from yet.
    NotStarted,
    /// Items are being pulled.
    Running,
    /// The producer was exhausted or hit the termination sentinel.
    Completed,
    /// Cancelled, or failed with an error.
    Aborted,
}

impl StreamState {
    /// Check if the stream reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

/// State shared by a stream and its iteration handle.
#[derive(Debug)]
struct Lifecycle {
    state: Mutex<StreamState>,
    controller: CancellationToken,
}

impl Lifecycle {
    fn start(&self) {
        let mut state = self.state.lock();
        if *state == StreamState::NotStarted {
            *state = StreamState::Running;
        }
    }

    fn complete(&self) {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            *state = StreamState::Completed;
        }
    }

    /// Cancel the source unless a terminal state was already reached.
    /// Returns whether this call did the cancelling.
    fn abort(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return false;
        }
        *state = StreamState::Aborted;
        self.controller.cancel();
        true
    }
}

type Producer<T> = Pin<Box<dyn Stream<Item = StreamResult<T>> + Send>>;

/// A lazily decoded stream of items that may be iterated once.
pub struct EventStream<T> {
    producer: Option<Producer<T>>,
    lifecycle: Arc<Lifecycle>,
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("state", &self.state())
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl<T> EventStream<T> {
    /// Wrap a producer. Cancelling `controller` must stop the producer's
    /// byte source.
    pub fn new<P>(producer: P, controller: CancellationToken) -> Self
    where
        P: Stream<Item = StreamResult<T>> + Send + 'static,
    {
        Self {
            producer: Some(Box::pin(producer)),
            lifecycle: Arc::new(Lifecycle {
                state: Mutex::new(StreamState::NotStarted),
                controller,
            }),
        }
    }

    /// The cancellation handle of this stream.
    pub fn controller(&self) -> &CancellationToken {
        &self.lifecycle.controller
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        *self.lifecycle.state.lock()
    }

    /// Check if the stream was already handed out for iteration.
    pub fn is_consumed(&self) -> bool {
        self.producer.is_none()
    }

    /// Cancel the stream. Does nothing once a terminal state was reached.
    pub fn abort(&self) {
        if self.lifecycle.abort() {
            debug!("Stream aborted by caller");
        }
    }

    /// Start iterating.
    ///
    /// Fails with [`StreamError::AlreadyConsumed`] on every call after the
    /// first.
    pub fn iterate(&mut self) -> StreamResult<EventIter<T>> {
        let producer = self.producer.take().ok_or(StreamError::AlreadyConsumed)?;
        Ok(EventIter {
            producer,
            lifecycle: Arc::clone(&self.lifecycle),
            finished: false,
        })
    }
}

impl EventStream<StreamEvent> {
    /// Convert into a stream of caller types.
    ///
    /// Each event is deserialized with [`StreamEvent::deserialize_into`];
    /// a mismatch surfaces as [`StreamError::Json`] at that item.
    pub fn into_typed<T>(mut self) -> StreamResult<EventStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let producer = self.producer.take().ok_or(StreamError::AlreadyConsumed)?;
        let typed = producer.map(|item| {
            item.and_then(|event| event.deserialize_into::<T>().map_err(StreamError::from))
        });
        Ok(EventStream {
            producer: Some(Box::pin(typed)),
            lifecycle: Arc::clone(&self.lifecycle),
        })
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        // Once iterating, the handle owns cancellation.
        if self.producer.is_some() && self.lifecycle.abort() {
            debug!("Stream dropped before iteration; source cancelled");
        }
    }
}

/// Iteration handle returned by [`EventStream::iterate`].
///
/// Dropping it before the stream completes cancels the byte source.
pub struct EventIter<T> {
    producer: Producer<T>,
    lifecycle: Arc<Lifecycle>,
    finished: bool,
}

impl<T> fmt::Debug for EventIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventIter")
            .field("state", &*self.lifecycle.state.lock())
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T> Stream for EventIter<T> {
    type Item = StreamResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if this.finished {
            return Poll::Ready(None);
        }

        // Anything decoded but not yet yielded is discarded on cancellation.
        if this.lifecycle.controller.is_cancelled() {
            this.finished = true;
            this.lifecycle.abort();
            return Poll::Ready(None);
        }

        this.lifecycle.start();

        match this.producer.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(StreamError::Aborted))) => {
                this.finished = true;
                this.lifecycle.abort();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(error))) => {
                this.finished = true;
                if this.lifecycle.abort() {
                    debug!(error = %error, "Stream failed; source cancelled");
                }
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                this.lifecycle.complete();
                debug!("Stream completed");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for EventIter<T> {
    fn drop(&mut self) {
        if self.lifecycle.abort() {
            debug!("Stream dropped before completion; source cancelled");
        }
    }
}

/// Byte source that stops as soon as its controller is cancelled.
///
/// Cancellation yields a single [`StreamError::Aborted`] and releases the
/// inner source, closing the connection behind it.
pub(crate) struct CancellableSource<S> {
    inner: Option<Pin<Box<S>>>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl<S> CancellableSource<S> {
    pub(crate) fn new(inner: S, controller: CancellationToken) -> Self {
        Self {
            inner: Some(Box::pin(inner)),
            cancelled: Box::pin(controller.cancelled_owned()),
        }
    }
}

impl<S, E> Stream for CancellableSource<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    type Item = StreamResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.inner = None;
            return Poll::Ready(Some(Err(StreamError::Aborted)));
        }

        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(Err(error))) => {
                this.inner = None;
                Poll::Ready(Some(Err(StreamError::transport(error))))
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
