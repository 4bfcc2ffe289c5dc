//! Byte-level SSE frame splitting.

use crate::buffer::ByteAccumulator;
use bytes::Bytes;

/// Splits raw bytes into frame-sized spans ending at a blank line.
///
/// A boundary is a line terminator immediately followed by another one,
/// where a terminator is `\n` or `\r\n`. That covers `\n\n`, `\r\n\r\n`
/// and the mixed `\n\r\n` / `\r\n\n` forms. Each yielded span includes its
/// boundary, so feeding the spans through a [`LineDecoder`] produces the
/// blank line that finalizes the frame.
///
/// [`LineDecoder`]: crate::line::LineDecoder
#[derive(Debug, Default)]
pub struct FrameChunker {
    buffer: ByteAccumulator,
}

impl FrameChunker {
    /// Create a new frame chunker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every frame span it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.buffer.extend(chunk);

        let mut frames = Vec::new();
        loop {
            match find_boundary(self.buffer.as_bytes(), self.buffer.scanned()) {
                Ok(end) => frames.push(self.buffer.split_to(end)),
                Err(resume) => {
                    self.buffer.mark_scanned(resume);
                    break;
                }
            }
        }
        frames
    }

    /// Take the remaining bytes once the input has ended.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.take_all())
    }

    /// Number of bytes waiting for a boundary.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Locate the end of the first frame boundary at or after `from`.
///
/// On failure returns the offset the next search must restart from: a
/// trailing `\n` or `\n\r` may still become a boundary once more bytes
/// arrive.
fn find_boundary(bytes: &[u8], from: usize) -> Result<usize, usize> {
    for i in from..bytes.len() {
        if bytes[i] != b'\n' {
            continue;
        }
        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(b'\n'), _) => return Ok(i + 2),
            (Some(b'\r'), Some(b'\n')) => return Ok(i + 3),
            (None, _) | (Some(b'\r'), None) => return Err(i),
            _ => {}
        }
    }
    Err(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn spans(chunker: &mut FrameChunker, input: &[u8], piece: usize) -> Vec<Vec<u8>> {
        let mut out: Vec<Vec<u8>> = Vec::new();
        for chunk in input.chunks(piece) {
            out.extend(chunker.push(chunk).into_iter().map(|b| b.to_vec()));
        }
        out.extend(chunker.finish().map(|b| b.to_vec()));
        out
    }

    #[rstest]
    #[case(&b"data: a\n\n"[..], 9)]
    #[case(&b"data: a\r\n\r\n"[..], 11)]
    #[case(&b"data: a\r\n\n"[..], 10)]
    #[case(&b"data: a\n\r\n"[..], 10)]
    fn test_boundary_forms(#[case] input: &[u8], #[case] end: usize) {
        assert_eq!(find_boundary(input, 0), Ok(end));
    }

    #[test]
    fn test_single_newline_is_not_a_boundary() {
        let mut chunker = FrameChunker::new();
        assert!(chunker.push(b"data: a\ndata: b\n").is_empty());
        assert_eq!(chunker.push(b"\n"), vec![Bytes::from_static(b"data: a\ndata: b\n\n")]);
        assert_eq!(chunker.pending_len(), 0);
    }

    #[test]
    fn test_boundary_split_across_chunks() {
        let mut chunker = FrameChunker::new();
        assert!(chunker.push(b"data: x\r\n").is_empty());
        assert!(chunker.push(b"\r").is_empty());
        assert_eq!(
            chunker.push(b"\ndata: y"),
            vec![Bytes::from_static(b"data: x\r\n\r\n")]
        );
        assert_eq!(chunker.finish(), Some(Bytes::from_static(b"data: y")));
    }

    #[test]
    fn test_many_frames_in_one_chunk() {
        let mut chunker = FrameChunker::new();
        let frames = chunker.push(b"data: 1\n\ndata: 2\n\ndata: 3\n\n");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], Bytes::from_static(b"data: 3\n\n"));
        assert!(chunker.finish().is_none());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    fn test_fragmentation_independent(#[case] piece: usize) {
        let input = b"event: a\ndata: 1\n\n: note\r\ndata: 2\r\n\r\ndata: tail";
        let whole = spans(&mut FrameChunker::new(), input, input.len());
        assert_eq!(spans(&mut FrameChunker::new(), input, piece), whole);
        assert_eq!(whole.concat(), input.to_vec());
    }
}
