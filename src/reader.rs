//! Synchronous observation loop over one byte source
//!
//! [`ObservationReader`] owns the transport for its whole lifetime together
//! with the extractor and decoder. Each pull blocks until one frame has been
//! read and decoded. Nothing is retried here: format errors are returned for
//! the caller to skip, transport errors for the caller to give up on.
//!
//! ```rust,no_run
//! use nm150::{ObservationReader, SentenceDecoder, UnitSystem};
//! use nm150::sources::ReaderSource;
//!
//! fn run() -> nm150::Result<()> {
//!     let source = ReaderSource::open_device("/dev/ttyUSB0")?;
//!     let reader = ObservationReader::new(source, SentenceDecoder::wimda(UnitSystem::Us));
//!     for result in reader {
//!         match result {
//!             Ok(record) => println!("{:?}", record),
//!             Err(e) if e.is_format_error() => continue,
//!             Err(e) => return Err(e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use tracing::{debug, warn};

use crate::StationConfig;
use crate::decoder::SentenceDecoder;
use crate::framing::FrameExtractor;
use crate::source::ByteSource;
use crate::types::{Frame, MeasurementRecord};
use crate::{Result, StationError};

/// Pull-based reader producing one decoded record per call.
pub struct ObservationReader<S> {
    source: S,
    extractor: FrameExtractor,
    decoder: SentenceDecoder,
    chunk: Vec<u8>,
    frames: u64,
    rejected: u64,
    closed: bool,
}

impl<S: ByteSource> ObservationReader<S> {
    pub fn new(source: S, decoder: SentenceDecoder) -> Self {
        let extractor = FrameExtractor::for_tag(&decoder.schema().tag);
        Self::with_extractor(source, extractor, decoder)
    }

    /// Reader using the WIMDA schema and the sizes from `config`
    pub fn from_config(source: S, config: &StationConfig) -> Self {
        let decoder = SentenceDecoder::wimda(config.units);
        let extractor = FrameExtractor::for_tag(&decoder.schema().tag)
            .with_chunk_size(config.chunk_size)
            .with_max_frame_len(config.max_frame_len);
        Self::with_extractor(source, extractor, decoder)
    }

    pub fn with_extractor(source: S, extractor: FrameExtractor, decoder: SentenceDecoder) -> Self {
        debug!(source = %source.describe(), ?decoder, "Observation reader created");
        let chunk = vec![0u8; extractor.chunk_size()];
        Self { source, extractor, decoder, chunk, frames: 0, rejected: 0, closed: false }
    }

    /// Block until the next frame is available
    pub fn next_frame(&mut self) -> Result<Frame> {
        let frame = self.extractor.read_frame(&mut self.source)?;
        self.frames += 1;
        debug!(frame = %frame, "Read frame");
        Ok(frame)
    }

    /// Block until the next frame is read, then decode it
    pub fn next_record(&mut self) -> Result<MeasurementRecord> {
        let frame = self.next_frame()?;
        self.decoder.decode_frame(&frame).inspect_err(|_| self.rejected += 1)
    }

    /// Make at most one source read and decode a frame if one completed.
    ///
    /// `Ok(None)` means no frame is complete yet. Lets a caller check for
    /// cancellation between reads instead of blocking until a frame arrives.
    pub fn poll_record(&mut self) -> Result<Option<MeasurementRecord>> {
        let frame = match self.extractor.try_extract() {
            Some(frame) => frame,
            None => {
                let read = self.source.read_chunk(&mut self.chunk)?;
                self.extractor.feed(&self.chunk[..read]);
                match self.extractor.try_extract() {
                    Some(frame) => frame,
                    None => return Ok(None),
                }
            }
        };

        self.frames += 1;
        debug!(frame = %frame, "Read frame");
        self.decoder.decode_frame(&frame).map(Some).inspect_err(|_| self.rejected += 1)
    }

    /// Frames read so far, decoded or not
    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Frames that failed to decode
    pub fn frames_rejected(&self) -> u64 {
        self.rejected
    }

    pub fn extractor(&self) -> &FrameExtractor {
        &self.extractor
    }

    pub fn decoder(&self) -> &SentenceDecoder {
        &self.decoder
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Release the reader, handing back its source
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Yields every pull result until the source fails or closes.
///
/// Format errors are yielded and iteration continues; the first transport
/// error is yielded and ends the iteration.
impl<S: ByteSource> Iterator for ObservationReader<S> {
    type Item = Result<MeasurementRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }

        match self.next_record() {
            Err(StationError::Disconnected { reason }) => {
                debug!(%reason, "Source closed");
                self.closed = true;
                None
            }
            Err(e) if e.is_transport_error() => {
                warn!(error = %e, "Source failed");
                self.closed = true;
                Some(Err(e))
            }
            other => Some(other),
        }
    }
}
