//! Entry points that compose the decoders into an [`EventStream`].

use crate::assemble::SseEvents;
use crate::config::StreamConfig;
use crate::error::BoxError;
use crate::events::StreamEvent;
use crate::ndjson::NdjsonEvents;
use crate::sse::SseFrames;
use crate::stream::{CancellableSource, EventStream};
use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl EventStream<StreamEvent> {
    /// Decode a Server-Sent Events byte stream.
    pub fn from_sse<S, E>(source: S, config: StreamConfig) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_sse_with_controller(source, CancellationToken::new(), config)
    }

    /// Decode a Server-Sent Events byte stream, cancelled through
    /// `controller`.
    pub fn from_sse_with_controller<S, E>(
        source: S,
        controller: CancellationToken,
        config: StreamConfig,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        debug!(sentinel = %config.done_sentinel, "Starting SSE stream");
        let source = CancellableSource::new(source, controller.clone());
        let events = SseEvents::new(SseFrames::new(source), &config);
        Self::new(events, controller)
    }

    /// Decode a newline-delimited JSON byte stream.
    pub fn from_delimited_json<S, E>(source: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_delimited_json_with_controller(source, CancellationToken::new())
    }

    /// Decode a newline-delimited JSON byte stream, cancelled through
    /// `controller`.
    pub fn from_delimited_json_with_controller<S, E>(
        source: S,
        controller: CancellationToken,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        debug!("Starting NDJSON stream");
        let source = CancellableSource::new(source, controller.clone());
        Self::new(NdjsonEvents::new(source), controller)
    }
}
