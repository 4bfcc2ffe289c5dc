//! # sdk-stream
//!
//! Streaming response decoding for generated REST clients.
//!
//! This crate turns the chunked body of a streaming HTTP response into a
//! lazily produced, single-pass sequence of application events. Two wire
//! shapes are supported: Server-Sent Events and newline-delimited JSON.
//! Chunks may be fragmented arbitrarily; lines, code points and frames that
//! span chunk boundaries are reassembled.
//!
//! ## Core Concepts
//!
//! - **[`LineDecoder`]**: Split bytes into text lines, UTF-8 safe across chunks
//! - **[`FrameChunker`]**: Split bytes at blank-line SSE frame boundaries
//! - **[`SseDecoder`]**: Group lines into [`ServerSentEvent`] frames
//! - **[`EventAssembler`]**: Turn frames into [`StreamEvent`]s, honouring `[DONE]`
//! - **[`EventStream`]**: Single-consumption, cancellable stream of events
//!
//! ## Example - SSE
//!
//! ```ignore
//! use futures::StreamExt;
//! use sdk_stream::{EventStream, StreamConfig};
//!
//! let mut events = EventStream::from_sse(response.bytes_stream(), StreamConfig::default());
//!
//! let mut iter = events.iterate()?;
//! while let Some(event) = iter.next().await {
//!     println!("{:?}", event?);
//! }
//! // Breaking out early drops `iter`, which cancels the response body.
//! ```
//!
//! ## Example - HTTP response
//!
//! ```ignore
//! use sdk_stream::{from_response, StreamConfig};
//!
//! let response = reqwest::get("https://api.example.com/stream").await?;
//! let mut events = from_response(response, StreamConfig::default()).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assemble;
pub mod buffer;
pub mod chunker;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
mod factory;
pub mod line;
pub mod ndjson;
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod response;
pub mod sse;
pub mod stream;

// Re-exports
pub use assemble::{is_truthy, Assembled, EventAssembler, SseEvents};
pub use buffer::ByteAccumulator;
pub use chunker::FrameChunker;
pub use classify::{EventClass, EventClassifier, DEFAULT_PRIMARY_PREFIXES, ERROR_EVENT};
pub use config::{StreamConfig, DONE_SENTINEL};
pub use error::{BoxError, StreamError, StreamResult};
pub use events::StreamEvent;
pub use line::LineDecoder;
pub use ndjson::NdjsonEvents;
#[cfg(feature = "reqwest")]
pub use response::{from_response, from_response_with_controller, is_event_stream};
pub use sse::{ServerSentEvent, SseDecoder, SseFrames};
pub use stream::{EventIter, EventStream, StreamState};
pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        EventClass, EventStream, ServerSentEvent, StreamConfig, StreamError, StreamEvent,
        StreamResult, StreamState,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let config = StreamConfig::default();
        assert_eq!(config.done_sentinel, DONE_SENTINEL);
        assert_eq!(
            config.classifier().classify(Some(ERROR_EVENT)),
            EventClass::Error
        );
    }
}
