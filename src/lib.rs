//! Weather observations from NMEA-0183 ultrasonic weather stations.
//!
//! The New Mountain NM150 streams `$WIMDA` meteorological composite sentences
//! over a serial line. This crate turns that byte stream into loop packets:
//! barometric pressure, air temperature, relative humidity, true wind
//! direction and wind speed, converted to the unit system of your choice.
//!
//! # Layers
//!
//! - [`FrameExtractor`]: recovers sentences from an arbitrarily chunked byte
//!   stream, discarding noise, NUL padding and oversized partial frames
//! - [`SentenceDecoder`]: checks a sentence against its [`FieldSchema`] and
//!   converts each reading through a [`UnitConverter`]
//! - [`ObservationReader`]: synchronous loop over one [`ByteSource`]
//! - [`StationConnection`]: async driver publishing [`LoopPacket`]s to any
//!   number of subscribers
//!
//! ## Example (live station)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use nm150::{Station, StationConfig, UnitSystem};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> nm150::Result<()> {
//!     let config = StationConfig { units: UnitSystem::Metric, ..Default::default() };
//!     let connection = Station::connect(config).await?;
//!     let mut packets = connection.subscribe();
//!
//!     while let Some(packet) = packets.next().await {
//!         println!("{:?}", packet);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
pub mod convert;
pub mod decoder;
mod error;
pub mod framing;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Byte sources and the observation loop
pub mod reader;
pub mod source;
pub mod sources;

// Stream-based packet delivery
pub mod connection;
pub mod driver;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use config::StationConfig;
pub use connection::StationConnection;
pub use convert::{StandardConverter, UnitConverter};
pub use decoder::{SentenceDecoder, decode};
pub use framing::FrameExtractor;
pub use reader::ObservationReader;
pub use source::ByteSource;

/// Name of the configuration section and of the driver
pub const DRIVER_NAME: &str = "NM150";

/// Hardware reported by every connection
pub const HARDWARE_NAME: &str = "NM150";

pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unified entry point for station connections.
///
/// ```rust,no_run
/// use nm150::{Station, StationConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> nm150::Result<()> {
///     let config = StationConfig::from_file("station.yaml")?;
///     let connection = Station::replay("capture.nmea", config).await?;
///     println!("latest: {:?}", connection.latest());
///     Ok(())
/// }
/// ```
pub struct Station;

impl Station {
    /// Open the station's serial device and start reading.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configuration is invalid
    /// - the device node cannot be opened
    pub async fn connect(config: StationConfig) -> Result<StationConnection> {
        StationConnection::connect(config).await
    }

    /// Replay a recorded capture file as if it came from the device
    pub async fn replay<P: AsRef<std::path::Path>>(path: P, config: StationConfig) -> Result<StationConnection> {
        StationConnection::replay(path, config).await
    }
}
