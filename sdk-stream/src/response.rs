//! HTTP response entry point.
//!
//! Picks the decoder from the response's `Content-Type`: `text/event-stream`
//! bodies are decoded as SSE, anything else as newline-delimited JSON.

use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::events::StreamEvent;
use crate::stream::EventStream;
use mime::Mime;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Wrap a streaming response in an [`EventStream`].
///
/// Fails before any decoding when the status is not a success or when the
/// response has no body.
pub async fn from_response(
    response: Response,
    config: StreamConfig,
) -> StreamResult<EventStream<StreamEvent>> {
    from_response_with_controller(response, CancellationToken::new(), config).await
}

/// Like [`from_response`], cancelled through `controller`.
pub async fn from_response_with_controller(
    response: Response,
    controller: CancellationToken,
    config: StreamConfig,
) -> StreamResult<EventStream<StreamEvent>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Streaming request failed");
        return Err(StreamError::Http {
            status: status.as_u16(),
            body,
        });
    }

    if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
        return Err(StreamError::MissingBody);
    }

    if is_event_stream(response.headers()) {
        debug!(status = %status, "Decoding response as SSE");
        Ok(EventStream::from_sse_with_controller(
            response.bytes_stream(),
            controller,
            config,
        ))
    } else {
        debug!(status = %status, "Decoding response as NDJSON");
        Ok(EventStream::from_delimited_json_with_controller(
            response.bytes_stream(),
            controller,
        ))
    }
}

/// Check if the headers declare a `text/event-stream` body.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|parsed| parsed.essence_str() == mime::TEXT_EVENT_STREAM.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamState;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// The server is returned so it outlives the response body.
    async fn serve(template: ResponseTemplate) -> (MockServer, Response) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(template)
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/stream", server.uri()))
            .await
            .unwrap();
        (server, response)
    }

    async fn collect(events: &mut EventStream<StreamEvent>) -> Vec<serde_json::Value> {
        events
            .iterate()
            .unwrap()
            .map(|item| item.unwrap().into_data())
            .collect()
            .await
    }

    #[test]
    fn test_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_event_stream(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream; charset=utf-8"));
        assert!(is_event_stream(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
        assert!(!is_event_stream(&headers));
    }

    #[tokio::test]
    async fn test_sse_response() {
        let (_server, response) = serve(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"n\":1}\n\ndata: [DONE]\n\n", "text/event-stream"),
        )
        .await;

        let mut events = from_response(response, StreamConfig::default()).await.unwrap();
        assert_eq!(collect(&mut events).await, vec![json!({"n": 1})]);
        assert_eq!(events.state(), StreamState::Completed);
    }

    #[tokio::test]
    async fn test_ndjson_response() {
        let (_server, response) = serve(
            ResponseTemplate::new(200)
                .set_body_raw("{\"a\":1}\n\n{\"b\":2}\n", "application/x-ndjson"),
        )
        .await;

        let mut events = from_response(response, StreamConfig::default()).await.unwrap();
        assert_eq!(collect(&mut events).await, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[tokio::test]
    async fn test_error_status() {
        let (_server, response) =
            serve(ResponseTemplate::new(503).set_body_string("overloaded")).await;

        let err = from_response(response, StreamConfig::default())
            .await
            .unwrap_err();
        match err {
            StreamError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_body() {
        let (_server, response) = serve(ResponseTemplate::new(204)).await;

        let err = from_response(response, StreamConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::MissingBody));
    }
}
