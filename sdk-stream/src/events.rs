//! Stream items yielded to callers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A decoded application-level event.
///
/// Serializes to the bare payload for [`StreamEvent::Payload`] and to
/// `{"event": ..., "data": ...}` for [`StreamEvent::Named`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// Parsed JSON payload of an unnamed or primary event, or an NDJSON line.
    Payload(Value),
    /// Parsed JSON payload of any other named event.
    Named {
        /// Event name.
        event: String,
        /// Parsed payload.
        data: Value,
    },
}

impl StreamEvent {
    /// Event name, for named events.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Payload(_) => None,
            Self::Named { event, .. } => Some(event.as_str()),
        }
    }

    /// The parsed payload.
    pub fn data(&self) -> &Value {
        match self {
            Self::Payload(data) | Self::Named { data, .. } => data,
        }
    }

    /// Consume the event, returning its payload.
    pub fn into_data(self) -> Value {
        match self {
            Self::Payload(data) | Self::Named { data, .. } => data,
        }
    }

    /// Check if this is a named event.
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named { .. })
    }

    /// Deserialize the event into a caller type.
    ///
    /// Payload events deserialize from the payload itself, named events
    /// from their `{"event", "data"}` pair.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Self::Payload(data) => serde_json::from_value(data),
            named => serde_json::from_value(serde_json::to_value(named)?),
        }
    }
}

impl From<Value> for StreamEvent {
    fn from(value: Value) -> Self {
        Self::Payload(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Delta {
        text: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Envelope {
        event: String,
        data: Delta,
    }

    #[test]
    fn test_accessors() {
        let payload = StreamEvent::from(json!({"a": 1}));
        assert!(!payload.is_named());
        assert_eq!(payload.event_name(), None);
        assert_eq!(payload.data()["a"], 1);

        let named = StreamEvent::Named {
            event: "thread.created".into(),
            data: json!({"id": "t1"}),
        };
        assert_eq!(named.event_name(), Some("thread.created"));
        assert_eq!(named.into_data(), json!({"id": "t1"}));
    }

    #[test]
    fn test_serialization_shape() {
        let named = StreamEvent::Named {
            event: "ping".into(),
            data: json!(null),
        };
        assert_eq!(
            serde_json::to_value(&named).unwrap(),
            json!({"event": "ping", "data": null})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::Payload(json!([1, 2]))).unwrap(),
            json!([1, 2])
        );
    }

    #[test]
    fn test_deserialize_into() {
        let delta: Delta = StreamEvent::Payload(json!({"text": "hi"}))
            .deserialize_into()
            .unwrap();
        assert_eq!(delta.text, "hi");

        let envelope: Envelope = StreamEvent::Named {
            event: "delta".into(),
            data: json!({"text": "yo"}),
        }
        .deserialize_into()
        .unwrap();
        assert_eq!(envelope.event, "delta");
        assert_eq!(envelope.data, Delta { text: "yo".into() });
    }
}
