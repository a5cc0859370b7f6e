//! Sentence framing over chunked byte streams
//!
//! Serial reads arrive in arbitrary pieces: a sentence may be split across
//! reads, several sentences may share one read, and the link pads with NUL
//! bytes. [`FrameExtractor`] buffers the pieces and hands back one complete
//! sentence at a time.

mod extractor;

pub use extractor::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_LEN, FrameExtractor};
