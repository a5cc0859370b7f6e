//! Byte sources over `std::io::Read` transports (serial device nodes, pipes)

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::source::ByteSource;
use crate::{Result, StationError};

/// What a zero-length read means for the wrapped reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroRead {
    /// The read timed out (serial ports configured with a read timeout)
    Timeout,
    /// The stream has ended (pipes, sockets, plain files)
    EndOfStream,
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// `TimedOut`, `WouldBlock` and `Interrupted` errors count as a read with no
/// data. Every other I/O error is a transport failure.
pub struct ReaderSource<R> {
    inner: R,
    label: String,
    zero_read: ZeroRead,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R, label: impl Into<String>, zero_read: ZeroRead) -> Self {
        Self { inner, label: label.into(), zero_read }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ReaderSource<File> {
    /// Open a serial device node for reading.
    ///
    /// Line settings (baud rate, raw mode, read timeout) belong to the
    /// device and must be applied before opening, e.g.
    /// `stty -F /dev/ttyUSB0 4800 raw min 0 time 30`. With `time` set the
    /// driver returns zero bytes on timeout, which this source reports as
    /// a read with no data.
    pub fn open_device<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| StationError::file_error(path.to_path_buf(), e))?;

        info!(port = %path.display(), "Opened station device");
        Ok(Self::new(file, path.display().to_string(), ZeroRead::Timeout))
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() && self.zero_read == ZeroRead::EndOfStream => {
                debug!(source = %self.label, "Reader reached end of stream");
                Err(StationError::disconnected(format!("{} reached end of stream", self.label)))
            }
            Ok(read) => Ok(read),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(StationError::transport_failed_with_source(
                format!("read from {} failed", self.label),
                Box::new(e),
            )),
        }
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct FlakyReader {
        results: Vec<io::Result<Vec<u8>>>,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.results.remove(0) {
                Ok(bytes) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    #[test]
    fn cursor_reads_then_disconnects() {
        let mut source =
            ReaderSource::new(Cursor::new(b"$WIMDA,1\n".to_vec()), "cursor", ZeroRead::EndOfStream);
        let mut buf = [0u8; 70];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 9);
        let err = source.read_chunk(&mut buf).unwrap_err();
        assert!(matches!(err, StationError::Disconnected { .. }));
    }

    #[test]
    fn zero_read_as_timeout_keeps_going() {
        let mut source = ReaderSource::new(Cursor::new(Vec::new()), "tty", ZeroRead::Timeout);
        let mut buf = [0u8; 8];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn timeouts_map_to_empty_reads() {
        let reader = FlakyReader {
            results: vec![
                Err(io::Error::from(ErrorKind::TimedOut)),
                Err(io::Error::from(ErrorKind::WouldBlock)),
                Ok(b"ab".to_vec()),
                Err(io::Error::from(ErrorKind::BrokenPipe)),
            ],
        };
        let mut source = ReaderSource::new(reader, "flaky", ZeroRead::Timeout);
        let mut buf = [0u8; 8];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 2);

        let err = source.read_chunk(&mut buf).unwrap_err();
        assert!(matches!(err, StationError::Transport { .. }));
        assert!(err.to_string().contains("flaky"));
    }

    #[test]
    fn missing_device_is_file_error() {
        let err = ReaderSource::open_device("/nonexistent/ttyUSB9").err().unwrap();
        assert!(matches!(err, StationError::File { .. }));
    }
}
