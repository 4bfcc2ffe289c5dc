//! Stream decoding configuration.

use crate::classify::{EventClassifier, DEFAULT_PRIMARY_PREFIXES};

/// Default in-band termination sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Configuration for SSE event assembly.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Event-name prefixes whose data is yielded without its name.
    pub primary_prefixes: Vec<String>,
    /// Data prefix that ends the stream.
    pub done_sentinel: String,
    /// Whether a payload with a truthy `error` field fails the stream.
    pub check_error_field: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            primary_prefixes: DEFAULT_PRIMARY_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            done_sentinel: DONE_SENTINEL.to_string(),
            check_error_field: true,
        }
    }
}

impl StreamConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a primary event prefix.
    pub fn primary_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.primary_prefixes.push(prefix.into());
        self
    }

    /// Replace the primary event prefixes.
    pub fn primary_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.primary_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the termination sentinel.
    pub fn done_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.done_sentinel = sentinel.into();
        self
    }

    /// Set whether truthy `error` fields fail the stream.
    pub fn check_error_field(mut self, check: bool) -> Self {
        self.check_error_field = check;
        self
    }

    /// Build the event classifier for this config.
    pub fn classifier(&self) -> EventClassifier {
        EventClassifier::new(self.primary_prefixes.iter().cloned())
    }
}
