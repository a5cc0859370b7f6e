//! Station configuration
//!
//! Settings come from a YAML stanza, either bare or nested under an `NM150`
//! key as in the host configuration file. Every key is optional; missing keys
//! take the station defaults.
//!
//! ```rust
//! use nm150::StationConfig;
//!
//! let config = StationConfig::from_yaml_str("NM150:\n  port: /dev/ttyS1\n  units: METRICWX\n")?;
//! assert_eq!(config.port.to_str(), Some("/dev/ttyS1"));
//! assert_eq!(config.baud, 4800);
//! # Ok::<(), nm150::StationError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::framing::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_LEN};
use crate::types::{UnitSystem, UpdateRate};
use crate::{DRIVER_NAME, Result, StationError};

/// Serial device the station is usually attached to.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// NMEA-0183 line rate.
pub const DEFAULT_BAUD: u32 = 4800;

/// Serial read timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Smallest accepted `max_frame_len`; a full WIMDA sentence runs to about 100 bytes.
pub const MIN_MAX_FRAME_LEN: usize = 128;

const SUPPORTED_BAUD: [u32; 6] = [4800, 9600, 19200, 38400, 57600, 115200];

/// Settings for one station connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// Serial device node
    pub port: PathBuf,
    /// Line rate of the device node; advisory, applied externally (see `stty_args`)
    pub baud: u32,
    /// Read timeout of the device node; advisory, applied externally (see `stty_args`)
    pub timeout_secs: u64,
    /// Unit system of emitted packets
    pub units: UnitSystem,
    /// Bytes requested per read
    pub chunk_size: usize,
    /// Longest pending sentence kept while waiting for its terminator
    pub max_frame_len: usize,
    /// Minimum seconds between delivered packets, 0 for every packet
    pub rate_secs: u32,
    /// Consecutive transport failures tolerated before the driver stops
    pub max_consecutive_errors: u32,
    /// How long `connect` waits for the first packet
    pub first_packet_timeout_secs: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            port: PathBuf::from(DEFAULT_PORT),
            baud: DEFAULT_BAUD,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            units: UnitSystem::Us,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            rate_secs: 0,
            max_consecutive_errors: 10,
            first_packet_timeout_secs: 5,
        }
    }
}

impl StationConfig {
    /// Parse a YAML stanza and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)?;

        if let Some(section) = value.get(DRIVER_NAME).cloned() {
            value = section;
        }
        if value.is_null() {
            value = serde_yaml_ng::Value::Mapping(Default::default());
        }

        let config: Self = serde_yaml_ng::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| StationError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port.as_os_str().is_empty() {
            return Err(StationError::config("port must not be empty"));
        }
        if !SUPPORTED_BAUD.contains(&self.baud) {
            return Err(StationError::config(format!(
                "unsupported baud rate {} (expected one of {:?})",
                self.baud, SUPPORTED_BAUD
            )));
        }
        // termios VTIME counts tenths of a second in one byte
        if !(1..=25).contains(&self.timeout_secs) {
            return Err(StationError::config("timeout_secs must be between 1 and 25"));
        }
        if self.chunk_size == 0 {
            return Err(StationError::config("chunk_size must be at least 1"));
        }
        if self.max_frame_len < MIN_MAX_FRAME_LEN {
            return Err(StationError::config(format!(
                "max_frame_len must be at least {}",
                MIN_MAX_FRAME_LEN
            )));
        }
        if self.max_consecutive_errors == 0 {
            return Err(StationError::config("max_consecutive_errors must be at least 1"));
        }
        Ok(())
    }

    pub fn update_rate(&self) -> UpdateRate {
        UpdateRate::EverySecs(self.rate_secs).normalize()
    }

    pub fn first_packet_timeout(&self) -> Duration {
        Duration::from_secs(self.first_packet_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `stty` arguments putting the device node in the line mode the reader expects.
    ///
    /// Raw mode with `min 0` makes an idle read return zero bytes after the
    /// timeout instead of blocking forever.
    pub fn stty_args(&self) -> String {
        format!(
            "-F {} {} raw -echo min 0 time {}",
            self.port.display(),
            self.baud,
            self.timeout_secs * 10
        )
    }

    /// Configuration stanza written for a new installation.
    pub fn default_stanza() -> String {
        format!(
            "{}:\n    # This section is for the New Mountain NM150 weather station.\n    port: {}\n    baud: {}\n    units: US\n",
            DRIVER_NAME, DEFAULT_PORT, DEFAULT_BAUD
        )
    }
}
