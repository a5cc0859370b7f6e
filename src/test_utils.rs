//! Test utilities: scripted byte sources and sentence builders
//!
//! Shared by unit tests, integration tests and benchmarks so every test
//! speaks the same sample sentences.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::time::Duration;

use crate::source::ByteSource;
use crate::{Result, StationError};

/// A complete WIMDA sentence body (no `$`, no terminator).
///
/// 29.92 inHg, 20.0 C, 55 %, 180 degrees true, 10 knots.
pub const SAMPLE_WIMDA: &str =
    "WIMDA,29.92,I,1.0132,B,20.0,C,,C,55.0,,11.1,C,180.0,T,178.0,M,10.0,N,5.1,M";

/// Wrap a sentence body into a wire line: `$<body>\r\n`
pub fn sentence_line(body: &str) -> String {
    format!("${}\r\n", body)
}

/// Build a WIMDA body carrying the given readings.
///
/// The redundant fields (bar, m/s, magnetic direction) are filled in so the
/// sentence looks like real station output.
pub fn wimda_body(pressure_inhg: f64, air_temp_c: f64, humidity: f64, dir_true: f64, knots: f64) -> String {
    format!(
        "WIMDA,{:.2},I,{:.4},B,{:.1},C,,C,{:.1},,,C,{:.1},T,{:.1},M,{:.1},N,{:.1},M",
        pressure_inhg,
        pressure_inhg * 0.033_863_9,
        air_temp_c,
        humidity,
        dir_true,
        dir_true,
        knots,
        knots * 0.514_444,
    )
}

/// One scripted outcome of a read.
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Deliver these bytes, split across reads if the buffer is small
    Bytes(Vec<u8>),
    /// A read that timed out with no data
    Timeout,
    /// A transport failure
    Fail(String),
    /// A read that blocks this long, then times out with no data
    Pause(Duration),
}

/// Byte source replaying a fixed script of reads.
///
/// Reports the source as closed once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<ReadStep>,
    reads: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script delivering `chunks` one per read
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        chunks.into_iter().fold(Self::new(), |source, chunk| source.bytes(chunk.as_ref()))
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.steps.push_back(ReadStep::Bytes(bytes.to_vec()));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.steps.push_back(ReadStep::Timeout);
        self
    }

    pub fn fail(mut self, reason: &str) -> Self {
        self.steps.push_back(ReadStep::Fail(reason.to_string()));
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.steps.push_back(ReadStep::Pause(duration));
        self
    }

    /// Number of reads served so far
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// True once every scripted step has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let step = self.steps.pop_front().ok_or_else(|| StationError::disconnected("script exhausted"))?;
        self.reads += 1;

        match step {
            ReadStep::Bytes(bytes) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    self.steps.push_front(ReadStep::Bytes(bytes[count..].to_vec()));
                }
                Ok(count)
            }
            ReadStep::Timeout => Ok(0),
            ReadStep::Fail(reason) => Err(StationError::transport_failed(reason)),
            ReadStep::Pause(duration) => {
                std::thread::sleep(duration);
                Ok(0)
            }
        }
    }

    fn describe(&self) -> String {
        String::from("scripted source")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_splits_large_steps() {
        let mut source = ScriptedSource::new().bytes(b"abcdef").timeout();
        let mut buf = [0u8; 4];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
        assert!(source.read_chunk(&mut buf).unwrap_err().is_transport_error());
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn wimda_body_has_twenty_fields() {
        let body = wimda_body(29.92, 20.0, 55.0, 180.0, 10.0);
        assert_eq!(body.split(',').count(), 21);
        assert_eq!(SAMPLE_WIMDA.split(',').count(), 21);
    }
}
