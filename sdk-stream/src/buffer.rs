//! Pending byte buffer shared by the line and frame decoders.

use bytes::{Bytes, BytesMut};

/// Growing buffer of bytes not yet resolved into a line or frame.
///
/// Chunks are appended at the back and consumed as a prefix from the front,
/// so at any instant the buffer holds exactly the concatenation of every
/// chunk supplied minus everything already taken. Nothing is dropped or
/// duplicated between calls.
///
/// Searches remember how far they got, so a delimiter scan never revisits
/// bytes that were already known not to contain it.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    buffer: BytesMut,
    scanned: usize,
}

impl ByteAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            scanned: 0,
        }
    }

    /// Append a chunk.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// View the buffered bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Offset before which previous scans found no delimiter.
    pub fn scanned(&self) -> usize {
        self.scanned.min(self.buffer.len())
    }

    /// Record that no delimiter starts before `offset`.
    pub fn mark_scanned(&mut self, offset: usize) {
        self.scanned = offset.min(self.buffer.len());
    }

    /// Take everything up to and including the first `delimiter` byte.
    ///
    /// Returns `None` and keeps the buffer intact if the delimiter has not
    /// arrived yet.
    pub fn take_until(&mut self, delimiter: u8) -> Option<Bytes> {
        let start = self.scanned();
        match self.buffer[start..].iter().position(|&b| b == delimiter) {
            Some(pos) => Some(self.split_to(start + pos + 1)),
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Take the first `at` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `at` is greater than [`len`](Self::len).
    pub fn split_to(&mut self, at: usize) -> Bytes {
        self.scanned = self.scanned.saturating_sub(at);
        self.buffer.split_to(at).freeze()
    }

    /// Take every buffered byte, leaving the accumulator empty.
    pub fn take_all(&mut self) -> Bytes {
        self.scanned = 0;
        self.buffer.split().freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_until_across_chunks() {
        let mut buffer = ByteAccumulator::with_capacity(16);

        buffer.extend(b"par");
        assert!(buffer.take_until(b'\n').is_none());
        assert_eq!(buffer.scanned(), 3);

        buffer.extend(b"tial\nrest");
        assert_eq!(buffer.take_until(b'\n').unwrap(), &b"partial\n"[..]);
        assert_eq!(buffer.as_bytes(), b"rest");
        assert_eq!(buffer.scanned(), 0);
    }

    #[test]
    fn test_no_bytes_lost() {
        let mut buffer = ByteAccumulator::new();
        let mut taken = Vec::new();

        for chunk in [&b"a\nb"[..], b"", b"c\n\nd", b"e"] {
            buffer.extend(chunk);
            while let Some(line) = buffer.take_until(b'\n') {
                taken.extend_from_slice(&line);
            }
        }
        taken.extend_from_slice(&buffer.take_all());

        assert_eq!(taken, b"a\nbc\n\nde");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_split_to_adjusts_scan_offset() {
        let mut buffer = ByteAccumulator::new();
        buffer.extend(b"abcdef");
        buffer.mark_scanned(5);

        assert_eq!(buffer.split_to(2), &b"ab"[..]);
        assert_eq!(buffer.scanned(), 3);
        assert_eq!(buffer.len(), 4);
    }
}
