//! Streaming errors.

use serde_json::Value;
use thiserror::Error;

/// Boxed error type accepted from byte sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while decoding a streamed response.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A frame or line carried data that is not valid JSON.
    #[error("Failed to parse stream payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The server signalled an error in-band, either through an `error`
    /// event or a payload with a truthy `error` field.
    #[error("stream event error")]
    Event {
        /// Event name of the offending frame, if any.
        event: Option<String>,
        /// The payload as received.
        payload: Value,
    },

    /// The response had no body to decode.
    #[error("Attempted to iterate over a response with no body")]
    MissingBody,

    /// The stream was already handed out for iteration.
    #[error("Cannot iterate over a consumed stream")]
    AlreadyConsumed,

    /// The byte source ended with an error.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered a streaming request with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The byte source was cancelled.
    #[error("Stream aborted")]
    Aborted,
}

impl StreamError {
    /// Check if the error comes from misusing the stream rather than from
    /// the data it carried.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::AlreadyConsumed)
    }

    /// Payload attached to an in-band error event.
    pub fn event_payload(&self) -> Option<&Value> {
        match self {
            Self::Event { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Wrap an error raised by the byte source.
    pub fn transport<E: Into<BoxError>>(err: E) -> Self {
        Self::Transport(err.into())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = StreamError::Event {
            event: Some("error".into()),
            payload: json!({"message": "overloaded"}),
        };
        assert_eq!(err.to_string(), "stream event error");
        assert_eq!(
            StreamError::Http {
                status: 500,
                body: "boom".into()
            }
            .to_string(),
            "HTTP error 500: boom"
        );
    }

    #[test]
    fn test_event_payload_preserved() {
        let err = StreamError::Event {
            event: None,
            payload: json!({"error": {"code": "rate_limit"}}),
        };
        assert_eq!(
            err.event_payload().unwrap()["error"]["code"],
            "rate_limit"
        );
        assert!(StreamError::MissingBody.event_payload().is_none());
    }

    #[test]
    fn test_usage_error() {
        assert!(StreamError::AlreadyConsumed.is_usage_error());
        assert!(!StreamError::MissingBody.is_usage_error());
        assert!(!StreamError::Aborted.is_usage_error());
    }

    #[test]
    fn test_transport_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = StreamError::transport(io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("reset"));
    }
}
