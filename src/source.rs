//! Byte source trait for station transports

use crate::Result;

/// Trait for byte-producing transports
///
/// Sources abstract over the serial link, recorded captures and test
/// doubles. Each read blocks for at most the source's own timeout.
///
/// Returns:
/// - `Ok(n)` with `n > 0` - `n` bytes were written to the front of `buf`
/// - `Ok(0)` - the read timed out with no data, try again
/// - `Err(e)` - the transport failed or closed, do not retry on this source
pub trait ByteSource {
    /// Read up to `buf.len()` bytes
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Short description used in log lines (device path, capture file)
    fn describe(&self) -> String {
        String::from("byte source")
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(buf)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_chunk(buf)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
