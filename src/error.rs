//! # Telemetry Link Error Handling
//!
//! This module defines the TelemetryError enum, which represents the
//! session-level failures of the telemetry-link crate. Byte and frame level
//! anomalies have their own types (`HexError`, `FrameError`) and are absorbed
//! by the decoding session rather than surfaced here.

use thiserror::Error;

/// Represents the different error types that can end a probing attempt or a live session.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// The byte source reached end of stream or was already closed.
    #[error("Byte source closed")]
    SourceClosed,

    /// Every baud candidate was probed without a checksum-valid frame.
    #[error("No baud rate produced a valid frame ({tried} candidates tried)")]
    NoBaudFound { tried: usize },

    /// No port matched the known device descriptions and none was supplied.
    #[error("No serial port found")]
    PortNotFound,

    /// The operation was stopped by an external interrupt.
    #[error("Interrupted")]
    Interrupted,

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_serial::Error> for TelemetryError {
    fn from(e: tokio_serial::Error) -> Self {
        TelemetryError::SerialPortError(e.to_string())
    }
}
