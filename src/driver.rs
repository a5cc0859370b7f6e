//! Driver runs the observation loop and publishes loop packets

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::reader::ObservationReader;
use crate::source::ByteSource;
use crate::types::LoopPacket;
use crate::{Result, StationError};

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for loop packets; `None` before the first packet and after the end
    pub packets: watch::Receiver<Option<Arc<LoopPacket>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves with the totals once the loop has stopped
    pub handle: JoinHandle<DriverSummary>,
}

/// Totals reported when the driver loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub packets: u64,
    pub rejected: u64,
    pub transport_errors: u64,
}

/// Driver owns the reader on a blocking thread.
///
/// The loop policy is explicit here rather than buried in the reader:
/// - format errors are logged and the frame skipped
/// - transport errors back off and retry the same source, up to
///   `max_consecutive_errors` in a row
/// - a closed source ends the stream
///
/// Cancellation is checked between source reads, so a stop takes effect
/// within one source read timeout.
pub struct Driver;

impl Driver {
    /// Spawn the driver loop for `reader`
    pub fn spawn<S>(reader: ObservationReader<S>, max_consecutive_errors: u32) -> DriverChannels
    where
        S: ByteSource + Send + 'static,
    {
        let (packet_tx, packet_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_loop = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            Self::reader_loop(reader, packet_tx, cancel_loop, max_consecutive_errors.max(1))
        });

        DriverChannels { packets: packet_rx, cancel, handle }
    }

    fn reader_loop<S: ByteSource>(
        mut reader: ObservationReader<S>,
        packet_tx: watch::Sender<Option<Arc<LoopPacket>>>,
        cancel: CancellationToken,
        max_consecutive_errors: u32,
    ) -> DriverSummary {
        info!(source = %reader.source().describe(), "Station reader started");
        let mut summary = DriverSummary::default();
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Station reader cancelled");
                break;
            }

            match reader.poll_record() {
                Ok(Some(record)) => {
                    error_count = 0;
                    summary.packets += 1;
                    let packet = LoopPacket::new(record, timestamp_now());
                    trace!(packet = ?packet, "Loop packet");

                    if packet_tx.send(Some(Arc::new(packet))).is_err() {
                        debug!("Packet receivers dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_format_error() => {
                    summary.rejected += 1;
                    warn!("LOOP data failed: {}", e);
                }
                Err(StationError::Disconnected { reason }) => {
                    info!(%reason, "Station source closed");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    summary.transport_errors += 1;
                    error!("Source error ({}/{}): {}", error_count, max_consecutive_errors, e);

                    if error_count >= max_consecutive_errors {
                        error!("Too many source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    std::thread::sleep(backoff(error_count));
                }
            }
        }

        let _ = packet_tx.send(None);
        info!(
            packets = summary.packets,
            rejected = summary.rejected,
            transport_errors = summary.transport_errors,
            "Station reader stopped"
        );
        summary
    }
}

fn backoff(error_count: u32) -> Duration {
    Duration::from_millis(50 * (1 << error_count.min(5)))
}

/// Seconds since the epoch, rounded to the nearest second
pub fn timestamp_now() -> u64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    (elapsed.as_secs_f64() + 0.5) as u64
}

/// Wait for the driver to stop and collect its totals
pub async fn join(handle: JoinHandle<DriverSummary>) -> Result<DriverSummary> {
    handle.await.map_err(|e| StationError::transport_failed_with_source("driver task failed", Box::new(e)))
}
