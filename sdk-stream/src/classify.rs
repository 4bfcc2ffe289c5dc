//! Event-name classification.

/// Event name that always fails the stream.
pub const ERROR_EVENT: &str = "error";

/// Prefixes whose events carry the primary payload by default.
pub const DEFAULT_PRIMARY_PREFIXES: &[&str] = &[
    "response.",
    "transcript.",
    "image_edit.",
    "image_generation.",
];

/// How a frame is turned into a stream item, based on its event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Unnamed or allowlisted event: the parsed data is yielded as-is.
    Primary,
    /// Any other named event: yielded together with its name.
    Named,
    /// The `error` event: fails the stream.
    Error,
}

/// Classifies event names against a prefix allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventClassifier {
    prefixes: Vec<String>,
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_PREFIXES.iter().copied())
    }
}

impl EventClassifier {
    /// Create a classifier with the given primary prefixes.
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The primary prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Classify an event name. `None` is a frame without an `event:` line.
    pub fn classify(&self, event: Option<&str>) -> EventClass {
        match event {
            None => EventClass::Primary,
            Some(ERROR_EVENT) => EventClass::Error,
            Some(name) if self.prefixes.iter().any(|p| name.starts_with(p.as_str())) => {
                EventClass::Primary
            }
            Some(_) => EventClass::Named,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, EventClass::Primary)]
    #[case(Some("response.output_text.delta"), EventClass::Primary)]
    #[case(Some("transcript.text.done"), EventClass::Primary)]
    #[case(Some("image_edit.partial_image"), EventClass::Primary)]
    #[case(Some("image_generation.completed"), EventClass::Primary)]
    #[case(Some("thread.run.created"), EventClass::Named)]
    #[case(Some("response"), EventClass::Named)]
    #[case(Some(""), EventClass::Named)]
    #[case(Some("error"), EventClass::Error)]
    fn test_default_classification(#[case] event: Option<&str>, #[case] expected: EventClass) {
        assert_eq!(EventClassifier::default().classify(event), expected);
    }

    #[test]
    fn test_custom_prefixes() {
        let classifier = EventClassifier::new(["chat."]);
        assert_eq!(classifier.classify(Some("chat.delta")), EventClass::Primary);
        assert_eq!(classifier.classify(Some("response.created")), EventClass::Named);
        assert_eq!(classifier.prefixes(), ["chat.".to_string()]);
    }

    #[test]
    fn test_error_wins_over_prefix() {
        let classifier = EventClassifier::new(["err"]);
        assert_eq!(classifier.classify(Some("error")), EventClass::Error);
    }
}
