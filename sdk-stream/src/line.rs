//! Incremental line decoding.

use crate::buffer::ByteAccumulator;

/// Splits a chunked byte stream into text lines.
///
/// Lines are cut on the `\n` byte before any UTF-8 decoding happens. That
/// byte never occurs inside a multi-byte code point, so a character split
/// across two chunks is reassembled intact. Invalid sequences decode to
/// U+FFFD.
///
/// Yielded lines carry no trailing `\n` and at most one stripped `\r`.
/// Empty lines are preserved since they terminate SSE frames.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: ByteAccumulator,
}

impl LineDecoder {
    /// Create a new line decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.buffer.extend(chunk);

        let mut lines = Vec::new();
        while let Some(line) = self.buffer.take_until(b'\n') {
            lines.push(decode_line(&line));
        }
        lines
    }

    /// Feed a text chunk.
    pub fn decode_str(&mut self, chunk: &str) -> Vec<String> {
        self.decode(chunk.as_bytes())
    }

    /// Emit whatever is left once the input has ended.
    ///
    /// Returns a line even when the trailing bytes were never
    /// newline-terminated.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(decode_line(&self.buffer.take_all()))
    }

    /// Number of bytes waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
