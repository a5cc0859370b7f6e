//! Station connections: a running driver plus packet subscriptions
//!
//! A [`StationConnection`] owns the driver task for one byte source. Loop
//! packets are published on a watch channel, so every subscriber sees the
//! latest packet and a slow subscriber skips packets rather than queueing
//! them.

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::{self, Driver, DriverSummary};
use crate::reader::ObservationReader;
use crate::source::ByteSource;
use crate::sources::{ReaderSource, ReplaySource};
use crate::stream::ThrottleExt;
use crate::types::{LoopPacket, UnitSystem, UpdateRate};
use crate::{HARDWARE_NAME, Result, StationConfig};


/// Live or replayed connection to one station
pub struct StationConnection {
    /// Packet watch receiver
    packets: watch::Receiver<Option<Arc<LoopPacket>>>,

    /// Cancellation token for stopping the driver
    cancel: CancellationToken,

    /// Driver task, taken by `close`
    handle: Option<JoinHandle<DriverSummary>>,

    /// Rate used by `subscribe`
    rate: UpdateRate,

    units: UnitSystem,

    source: String,
}

impl StationConnection {
    /// Open the serial device named in `config` and start reading.
    ///
    /// Waits up to `first_packet_timeout` for the first packet. A station that
    /// stays silent is not an error: the connection is returned and the
    /// subscription streams wait for data.
    pub async fn connect(config: StationConfig) -> Result<Self> {
        config.validate()?;
        info!(port = %config.port.display(), baud = config.baud, units = ?config.units, "Connecting to station");

        debug!(stty = %config.stty_args(), timeout = ?config.timeout(), "Expected device line settings");
        let source = ReaderSource::open_device(&config.port)?;
        Self::start(source, &config).await
    }

    /// Replay a recorded capture through the driver.
    ///
    /// Reads are paced to the configured line rate so packets arrive about
    /// as fast as they would from the device.
    pub async fn replay<P: AsRef<Path>>(path: P, config: StationConfig) -> Result<Self> {
        config.validate()?;
        let source = ReplaySource::open(path)?.with_pace(line_pace(&config));
        Self::start(source, &config).await
    }

    /// Start a connection over any byte source
    pub async fn from_source<S>(source: S, config: StationConfig) -> Result<Self>
    where
        S: ByteSource + Send + 'static,
    {
        config.validate()?;
        Self::start(source, &config).await
    }

    async fn start<S>(source: S, config: &StationConfig) -> Result<Self>
    where
        S: ByteSource + Send + 'static,
    {
        let description = source.describe();
        let reader = ObservationReader::from_config(source, config);
        let channels = Driver::spawn(reader, config.max_consecutive_errors);

        let mut packet_rx = channels.packets.clone();
        let timeout = config.first_packet_timeout();
        let wait_result = tokio::time::timeout(timeout, async {
            while packet_rx.borrow_and_update().is_none() {
                if packet_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        if wait_result.is_err() {
            warn!(source = %description, ?timeout, "Timeout waiting for first packet from station");
        }

        info!(source = %description, "Station connection established");

        Ok(Self {
            packets: channels.packets,
            cancel: channels.cancel,
            handle: Some(channels.handle),
            rate: config.update_rate(),
            units: config.units,
            source: description,
        })
    }

    /// Subscribe at the configured rate
    pub fn subscribe(&self) -> impl Stream<Item = Arc<LoopPacket>> + Send + 'static {
        self.subscribe_with(self.rate)
    }

    /// Subscribe to loop packets at `rate`.
    ///
    /// The stream starts with the latest packet, if any, and ends when the
    /// driver stops.
    pub fn subscribe_with(&self, rate: UpdateRate) -> BoxStream<'static, Arc<LoopPacket>> {
        let packets = WatchStream::new(self.packets.clone()).filter_map(|opt| async move { opt });

        match rate.throttle_interval() {
            None => packets.boxed(),
            Some(period) => packets.throttle(period).boxed(),
        }
    }

    /// Latest packet, if the driver has produced one and is still running
    pub fn latest(&self) -> Option<Arc<LoopPacket>> {
        self.packets.borrow().clone()
    }

    pub fn hardware_name(&self) -> &'static str {
        HARDWARE_NAME
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn update_rate(&self) -> UpdateRate {
        self.rate
    }

    /// Device path or capture the connection reads from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stop the driver and wait for its totals
    pub async fn close(mut self) -> Result<DriverSummary> {
        self.cancel.cancel();
        match self.handle.take() {
            Some(handle) => driver::join(handle).await,
            None => Ok(DriverSummary::default()),
        }
    }
}

impl Drop for StationConnection {
    fn drop(&mut self) {
        debug!(source = %self.source, "Dropping station connection");
        self.cancel.cancel();
    }
}

/// Time the serial line needs to deliver one chunk (10 bits per byte)
fn line_pace(config: &StationConfig) -> Duration {
    let bits = config.chunk_size as u64 * 10;
    Duration::from_micros(bits * 1_000_000 / u64::from(config.baud))
}
