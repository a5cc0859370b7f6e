//! Error types for station telemetry processing.
//!
//! All errors implement `std::error::Error` and carry enough context to decide
//! whether the caller should keep pulling records or give up on the source.
//!
//! ## Error Categories
//!
//! - **Transport Errors**: the byte source failed or was closed
//! - **Format Errors**: a frame was extracted but did not match its schema
//! - **Conversion Errors**: a unit pair the converter cannot handle
//! - **Configuration Errors**: invalid or unreadable station settings
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use nm150::StationError;
//!
//! let error = StationError::format("WIMDA", "expected 20 fields, found 12");
//! if error.is_format_error() {
//!     // discard the frame, the next pull starts cleanly
//! }
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Unit;

/// Result type alias for station operations.
pub type Result<T, E = StationError> = std::result::Result<T, E>;

/// Main error type for station operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StationError {
    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Byte source closed: {reason}")]
    Disconnected { reason: String },

    #[error("Malformed {context} sentence: {details}")]
    Format { context: String, details: String },

    #[error("No conversion from {from} to {to}")]
    UnitConversion { from: Unit, to: Unit },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StationError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Format errors are recoverable by discarding the frame, so they count
    /// as retryable here even though nothing needs to be reopened.
    pub fn is_retryable(&self) -> bool {
        match self {
            StationError::Transport { .. } => true,
            StationError::Format { .. } => true,
            StationError::Disconnected { .. } => false,
            StationError::UnitConversion { .. } => false,
            StationError::Config { .. } => false,
            StationError::File { .. } => false,
        }
    }

    /// True for errors that only invalidate the current frame.
    pub fn is_format_error(&self) -> bool {
        matches!(self, StationError::Format { .. })
    }

    /// True for errors raised by the byte source.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, StationError::Transport { .. } | StationError::Disconnected { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StationError::Transport { .. } => vec![
                "Check the serial cable and USB adapter",
                "Verify the configured port exists",
                "Reopen the byte source",
            ],
            StationError::Disconnected { .. } => vec![
                "Reconnect the station",
                "Reopen the byte source",
                "For replays, the capture has been fully consumed",
            ],
            StationError::Format { .. } => vec![
                "Discard the frame and keep reading",
                "Check the station is configured to emit WIMDA sentences",
                "Verify the baud rate matches the station",
            ],
            StationError::UnitConversion { .. } => vec![
                "Choose a supported target unit system",
                "Supply a converter that handles this unit pair",
            ],
            StationError::Config { .. } => vec![
                "Check the station configuration values",
                "Compare against the default configuration stanza",
            ],
            StationError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
        }
    }

    /// Helper constructor for format errors.
    pub fn format(context: impl Into<String>, details: impl Into<String>) -> Self {
        StationError::Format { context: context.into(), details: details.into() }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        StationError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        StationError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for a closed byte source.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        StationError::Disconnected { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        StationError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        StationError::File { path, source }
    }
}

impl From<std::io::Error> for StationError {
    fn from(err: std::io::Error) -> Self {
        StationError::Transport { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<serde_yaml_ng::Error> for StationError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StationError::Config { reason: err.to_string() }
    }
}
