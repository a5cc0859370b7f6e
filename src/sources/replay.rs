//! Replay source for recorded station captures
//!
//! A capture is the raw byte stream logged from the serial port, NUL padding
//! and all. Replaying it through the same pipeline as the live device makes
//! station behaviour reproducible off the hardware.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use nm150::ByteSource;
//! use nm150::sources::ReplaySource;
//!
//! fn dump() -> nm150::Result<()> {
//!     let mut source = ReplaySource::open("capture.nmea")?;
//!     let mut buf = [0u8; 70];
//!     while let Ok(read) = source.read_chunk(&mut buf) {
//!         print!("{}", String::from_utf8_lossy(&buf[..read]));
//!     }
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::source::ByteSource;
use crate::{Result, StationError};

/// Serves a capture file chunk by chunk, closing at its end
pub struct ReplaySource {
    data: Vec<u8>,
    position: usize,
    path: PathBuf,
    pace: Option<Duration>,
}

impl ReplaySource {
    /// Load a capture file into memory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).map_err(|e| StationError::file_error(path.to_path_buf(), e))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| StationError::file_error(path.to_path_buf(), e))?;

        info!(path = %path.display(), bytes = data.len(), "Opened station capture");
        Ok(Self::from_bytes_with_path(data, path.to_path_buf()))
    }

    /// Create a replay from in-memory bytes (for testing)
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::from_bytes_with_path(data.into(), PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Self {
        Self { data, position: 0, path, pace: None }
    }

    /// Sleep this long before every read, approximating the serial line rate
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Bytes already served
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total capture size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rewind to the start of the capture
    pub fn rewind(&mut self) {
        debug!("Rewinding capture");
        self.position = 0;
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for ReplaySource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }

        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            debug!("Reached end of capture");
            return Err(StationError::disconnected(format!(
                "end of capture {}",
                self.path.display()
            )));
        }

        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_capture_in_chunks() {
        let mut source = ReplaySource::from_bytes(b"0123456789".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(source.position(), 10);

        let err = source.read_chunk(&mut buf).unwrap_err();
        assert!(matches!(err, StationError::Disconnected { .. }));
    }

    #[test]
    fn rewind_restarts_capture() {
        let mut source = ReplaySource::from_bytes(b"abc".to_vec());
        let mut buf = [0u8; 8];
        source.read_chunk(&mut buf).unwrap();
        source.rewind();
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 3);
    }

    #[test]
    fn missing_capture_is_file_error() {
        let err = ReplaySource::open("/nonexistent/capture.nmea").err().unwrap();
        assert!(matches!(err, StationError::File { .. }));
    }
}
