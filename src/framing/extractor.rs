//! Frame extraction from a NUL-padded, arbitrarily chunked byte stream

use tracing::{debug, trace};

use crate::Result;
use crate::source::ByteSource;
use crate::types::Frame;

/// Bytes requested from the source per read (the NM150 driver default).
pub const DEFAULT_CHUNK_SIZE: usize = 70;

/// Longest pending sentence kept while waiting for its terminator.
///
/// A full WIMDA sentence is under 100 bytes; anything past this is a frame
/// whose terminator was lost.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256;

const TERMINATOR: u8 = b'\n';

/// Buffers stream bytes and cuts complete sentences out of them.
///
/// A frame is the first `marker ... \n` span in buffer order. Bytes before
/// the marker are noise and are discarded; a second marker inside the span
/// does not split it. The leading `$` and the terminator (plus a trailing
/// `\r`) are not part of the returned frame.
///
/// A span longer than `max_frame_len` before its terminator is never a
/// frame. Its marker is dropped and scanning resumes one byte later, whether
/// the terminator has arrived yet or not.
///
/// The extractor is not synchronized. Share it between threads only behind
/// external synchronization.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    marker: Vec<u8>,
    buffer: Vec<u8>,
    max_frame_len: usize,
    chunk_size: usize,
    discarded: u64,
}

impl FrameExtractor {
    /// Create an extractor for an explicit start marker such as `$WIMDA,`
    pub fn new(marker: impl Into<Vec<u8>>) -> Self {
        Self {
            marker: marker.into(),
            buffer: Vec::new(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            chunk_size: DEFAULT_CHUNK_SIZE,
            discarded: 0,
        }
    }

    /// Create an extractor for sentences tagged `tag`
    pub fn for_tag(tag: &str) -> Self {
        Self::new(format!("${},", tag))
    }

    /// Set the longest pending frame kept while waiting for a terminator
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len.max(self.marker.len());
        self
    }

    /// Set the number of bytes requested per source read
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Append stream bytes, dropping NUL padding
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend(chunk.iter().copied().filter(|&b| b != 0));
    }

    /// Cut the next complete frame out of the buffer.
    ///
    /// Returns `None` when more bytes are needed. The pending partial frame
    /// is kept; everything that cannot become part of a frame is dropped.
    pub fn try_extract(&mut self) -> Option<Frame> {
        loop {
            let Some(start) = find(&self.buffer, &self.marker) else {
                self.keep_marker_prefix();
                return None;
            };

            if let Some(offset) = self.buffer[start..].iter().position(|&b| b == TERMINATOR) {
                if offset > self.max_frame_len {
                    // Same bound as an unterminated frame, so chunking cannot change the outcome
                    debug!(length = offset, max = self.max_frame_len, "Dropping oversized sentence");
                    self.discard(start + 1);
                    continue;
                }

                let end = start + offset;
                let body = &self.buffer[start + 1..end];
                let body = body.strip_suffix(b"\r").unwrap_or(body);
                let frame = Frame::new(String::from_utf8_lossy(body).into_owned());

                if start > 0 {
                    trace!(bytes = start, "Skipped noise before sentence");
                    self.discarded += start as u64;
                }
                self.buffer.drain(..=end);
                return Some(frame);
            }

            if start > 0 {
                self.discard(start);
            }

            if self.buffer.len() <= self.max_frame_len {
                return None;
            }

            // Terminator never arrived, abandon this marker and rescan
            debug!(
                pending = self.buffer.len(),
                max = self.max_frame_len,
                "Dropping unterminated sentence"
            );
            self.discard(1);
        }
    }

    /// Block on `source` until a complete frame is available.
    ///
    /// Zero-byte reads are timeouts and the loop keeps reading. Transport
    /// errors are returned immediately.
    pub fn read_frame<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Frame> {
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            if let Some(frame) = self.try_extract() {
                return Ok(frame);
            }

            let read = source.read_chunk(&mut chunk)?;
            if read == 0 {
                trace!("Read timed out with no data");
                continue;
            }
            self.feed(&chunk[..read]);
        }
    }

    /// Drop all buffered bytes
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes waiting for a terminator
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes thrown away as noise or abandoned frames
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Start-of-sentence marker, e.g. `$WIMDA,`
    pub fn marker(&self) -> &[u8] {
        &self.marker
    }

    /// Longest span kept from marker to terminator
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Bytes requested per source read in `read_frame`
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn discard(&mut self, count: usize) {
        self.buffer.drain(..count);
        self.discarded += count as u64;
    }

    /// With no marker in the buffer only a tail that may still grow into one matters.
    fn keep_marker_prefix(&mut self) {
        let keep = (1..self.marker.len())
            .rev()
            .find(|&len| self.buffer.ends_with(&self.marker[..len]))
            .unwrap_or(0);
        let drop = self.buffer.len() - keep;
        if drop > 0 {
            self.discard(drop);
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StationError;
    use crate::test_utils::{SAMPLE_WIMDA, ScriptedSource, sentence_line};

    fn extractor() -> FrameExtractor {
        FrameExtractor::for_tag("WIMDA")
    }

    fn drain(extractor: &mut FrameExtractor) -> Vec<String> {
        std::iter::from_fn(|| extractor.try_extract()).map(Frame::into_string).collect()
    }

    #[test]
    fn extracts_single_frame() {
        let mut ex = extractor();
        ex.feed(sentence_line(SAMPLE_WIMDA).as_bytes());
        assert_eq!(ex.try_extract().unwrap().as_str(), SAMPLE_WIMDA);
        assert_eq!(ex.buffered_len(), 0);
        assert!(ex.try_extract().is_none());
    }

    #[test]
    fn waits_for_terminator() {
        let mut ex = extractor();
        ex.feed(b"$WIMDA,29.92,I");
        assert!(ex.try_extract().is_none());
        assert_eq!(ex.buffered_len(), 14);
        ex.feed(b",1.01,B\n");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,29.92,I,1.01,B");
    }

    #[test]
    fn keeps_remainder_after_mid_chunk_terminator() {
        let mut ex = extractor();
        ex.feed(b"$WIMDA,1\r\n$WIMDA,2");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,1");
        assert!(ex.try_extract().is_none());
        ex.feed(b"\r\n");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,2");
    }

    #[test]
    fn strips_nul_padding_anywhere() {
        let mut ex = extractor();
        ex.feed(b"\0\0$WI\0MDA,29.\0\092\0\r\n\0");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,29.92");
    }

    #[test]
    fn skips_false_start_markers() {
        let mut ex = extractor();
        ex.feed(b"junk$$garbleWIMDA,xx$WIMDA,29.92,I\n");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,29.92,I");
        assert_eq!(ex.buffered_len(), 0);
        assert_eq!(ex.discarded(), 20);
    }

    #[test]
    fn ignores_other_sentence_types() {
        let mut ex = extractor();
        ex.feed(b"$WIMWV,180,T,10,N,A\r\n$WIMDA,1\r\n$WIXDR,C,20\r\n");
        assert_eq!(drain(&mut ex), vec!["WIMDA,1"]);
        assert_eq!(ex.buffered_len(), 0);
    }

    #[test]
    fn second_marker_inside_span_does_not_split() {
        let mut ex = extractor();
        ex.feed(b"$WIMDA,trunc$WIMDA,full\n");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,trunc$WIMDA,full");
    }

    #[test]
    fn multiple_frames_in_order() {
        let mut ex = extractor();
        ex.feed(b"$WIMDA,1\n$WIMDA,2\n$WIMDA,3\n");
        assert_eq!(drain(&mut ex), vec!["WIMDA,1", "WIMDA,2", "WIMDA,3"]);
    }

    #[test]
    fn noise_without_marker_is_not_retained() {
        let mut ex = extractor();
        for _ in 0..1000 {
            ex.feed(b"line noise without any marker\r\n");
            assert!(ex.try_extract().is_none());
        }
        assert_eq!(ex.buffered_len(), 0);
    }

    #[test]
    fn partial_marker_at_tail_is_retained() {
        let mut ex = extractor();
        ex.feed(b"garbage$WIM");
        assert!(ex.try_extract().is_none());
        assert_eq!(ex.buffered_len(), 4);
        ex.feed(b"DA,7\n");
        assert_eq!(ex.try_extract().unwrap().as_str(), "WIMDA,7");
    }

    #[test]
    fn unterminated_frame_is_abandoned() {
        let mut ex = extractor().with_max_frame_len(32);
        ex.feed(b"$WIMDA,");
        ex.feed(&[b'9'; 64]);
        assert!(ex.try_extract().is_none());
        assert!(ex.buffered_len() <= 32);

        ex.feed(b"\n$WIMDA,ok\n");
        assert_eq!(drain(&mut ex), vec!["WIMDA,ok"]);
    }

    #[test]
    fn oversized_sentence_dropped_whole_or_chunked() {
        let line = format!("$WIMDA,{}\n$WIMDA,ok\n", "9".repeat(300));

        let mut whole = extractor();
        whole.feed(line.as_bytes());
        let whole_frames = drain(&mut whole);

        let mut split = extractor();
        let mut split_frames = Vec::new();
        for chunk in line.as_bytes().chunks(70) {
            split.feed(chunk);
            split_frames.extend(drain(&mut split));
        }

        assert_eq!(whole_frames, vec!["WIMDA,ok"]);
        assert_eq!(split_frames, whole_frames);
        assert!(whole.discarded() >= 300);
        assert_eq!(whole.buffered_len(), 0);
    }

    #[test]
    fn sentence_at_the_bound_is_kept() {
        let mut ex = extractor().with_max_frame_len(32);
        let body = format!("WIMDA,{}", "1".repeat(25));
        ex.feed(format!("${}\n", body).as_bytes());
        assert_eq!(ex.try_extract().unwrap().into_string(), body);
    }

    #[test]
    fn reset_clears_buffer() {
        let mut ex = extractor();
        ex.feed(b"$WIMDA,partial");
        ex.try_extract();
        ex.reset();
        assert_eq!(ex.buffered_len(), 0);
    }

    #[test]
    fn read_frame_across_reads_and_timeouts() {
        let mut source = ScriptedSource::new()
            .timeout()
            .bytes(b"\0\0$WIMDA,29")
            .timeout()
            .bytes(b".92\r\n$WIM");
        let mut ex = extractor();
        let frame = ex.read_frame(&mut source).unwrap();
        assert_eq!(frame.as_str(), "WIMDA,29.92");
        assert_eq!(ex.buffered_len(), 4);
    }

    #[test]
    fn read_frame_respects_chunk_size() {
        let line = sentence_line(SAMPLE_WIMDA);
        let mut source = ScriptedSource::new().bytes(line.as_bytes());
        let mut ex = extractor().with_chunk_size(8);
        ex.read_frame(&mut source).unwrap();
        assert_eq!(source.reads(), line.len().div_ceil(8));
    }

    #[test]
    fn read_frame_propagates_transport_errors() {
        let mut source = ScriptedSource::new().bytes(b"$WIMDA,1").fail("cable unplugged");
        let mut ex = extractor();
        let err = ex.read_frame(&mut source).unwrap_err();
        assert!(matches!(err, StationError::Transport { .. }));
    }

    #[test]
    fn read_frame_returns_buffered_frame_without_reading() {
        let mut source = ScriptedSource::new();
        let mut ex = extractor();
        ex.feed(b"$WIMDA,1\n$WIMDA,2\n");
        assert_eq!(ex.read_frame(&mut source).unwrap().as_str(), "WIMDA,1");
        assert_eq!(ex.read_frame(&mut source).unwrap().as_str(), "WIMDA,2");
        assert_eq!(source.reads(), 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn stream() -> impl Strategy<Value = Vec<u8>> {
            let piece = prop_oneof![
                Just(b"$WIMDA,29.92,I,1.01,B\r\n".to_vec()),
                Just(b"$WIMDA,,,\n".to_vec()),
                Just(b"$WIMWV,180,T\r\n".to_vec()),
                Just(b"$$garble".to_vec()),
                Just(b"\0\0\0".to_vec()),
                prop::collection::vec(any::<u8>(), 0..16),
            ];
            prop::collection::vec(piece, 0..12).prop_map(|pieces| pieces.concat())
        }

        proptest! {
            #[test]
            fn chunking_does_not_change_frames(
                bytes in stream(),
                cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8)
            ) {
                let mut whole = extractor();
                whole.feed(&bytes);
                let expected = drain(&mut whole);

                let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
                points.sort_unstable();
                let mut split = extractor();
                let mut frames = Vec::new();
                let mut last = 0;
                for point in points.into_iter().chain(std::iter::once(bytes.len())) {
                    split.feed(&bytes[last..point]);
                    frames.extend(drain(&mut split));
                    last = point;
                }

                prop_assert_eq!(frames, expected);
            }

            #[test]
            fn nul_bytes_are_invisible(
                payload in "[0-9.,A-Z]{0,40}",
                nul_positions in prop::collection::vec(any::<prop::sample::Index>(), 0..10)
            ) {
                let line = format!("$WIMDA,{}\n", payload);
                let mut padded = line.clone().into_bytes();
                for index in nul_positions {
                    padded.insert(index.index(padded.len() + 1), 0);
                }

                let mut ex = extractor();
                ex.feed(&padded);
                let frame = ex.try_extract();
                let expected = format!("WIMDA,{}", payload);
                prop_assert_eq!(frame.map(Frame::into_string), Some(expected));
            }

            #[test]
            fn chunking_does_not_change_frames_near_the_bound(
                lengths in prop::collection::vec(40usize..90, 1..6),
                chunk in 1usize..100
            ) {
                let bytes: Vec<u8> = lengths
                    .iter()
                    .flat_map(|len| format!("xx$WIMDA,{}\r\n", "7".repeat(*len)).into_bytes())
                    .collect();

                let mut whole = extractor().with_max_frame_len(64);
                whole.feed(&bytes);
                let expected = drain(&mut whole);

                let mut split = extractor().with_max_frame_len(64);
                let mut frames = Vec::new();
                for piece in bytes.chunks(chunk) {
                    split.feed(piece);
                    frames.extend(drain(&mut split));
                }

                prop_assert_eq!(&frames, &expected);
                // Span is marker + digits + `\r`, kept only up to the bound
                let kept = lengths.iter().filter(|len| 7 + **len + 1 <= 64).count();
                prop_assert_eq!(expected.len(), kept);
            }

            #[test]
            fn buffer_holds_at_most_one_partial_frame(bytes in stream()) {
                let mut ex = extractor().with_max_frame_len(64);
                for chunk in bytes.chunks(7) {
                    ex.feed(chunk);
                    drain(&mut ex);
                    prop_assert!(ex.buffered_len() <= 64);
                }
            }
        }
    }
}
