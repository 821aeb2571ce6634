//! # telemetry-link - Decoder for a Framed ASCII-Hex Telemetry Link
//!
//! Sensor boards on this link send fixed eight byte frames, each byte spelled
//! out as two hex digits and a space:
//!
//! ```text
//! 7E 01 01 11 19 76 1E 7E
//! ^  ^  ^  ^  ^  ^^^^^ ^
//! |  |  |  |  |  CRC   end
//! |  |  |  |  data
//! |  |  |  query
//! |  |  device id
//! |  device type (01 temperature, 02 humidity)
//! start
//! ```
//!
//! ## Features
//!
//! - CRC-16/CCITT-FALSE validation of the four interior bytes
//! - Resynchronising frame assembly on a noisy, continuous stream
//! - Baud rate auto-negotiation by probing the standard rates in order
//! - Automatic serial port detection by USB description
//! - Readings surfaced even when their checksum does not match
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_link::{DecodingSession, DeviceKind};
//!
//! let mut session = DecodingSession::new();
//! let readings = session.feed_all(b"noise 7E 02 01 11 37 28 6E 7E ");
//! assert_eq!(readings.len(), 1);
//! assert_eq!(readings[0].device, DeviceKind::Humidity);
//! assert!(readings[0].checksum.is_ok());
//! ```

pub mod constants;
pub mod error;
pub mod link;
pub mod logging;
pub mod monitor;
pub mod util;

pub use crate::error::TelemetryError;
pub use crate::logging::{init_logger, log_info};

pub use link::{
    crc16, interpret, run_live, AsciiHexDecoder, BaudNegotiator, BaudRate, ByteSource,
    ChecksumStatus, DecodedReading, DecodingSession, DeviceKind, Frame, FrameAssembler,
    FrameError, NegotiationConfig, SerialConfig, SessionStats, SourceFactory,
};
pub use monitor::{MonitorConfig, SessionReport, TelemetryMonitor};

/// Probe `port` at every standard rate and return the first one that
/// delivers a checksum-valid frame.
///
/// # Arguments
/// * `port` - Serial port path (e.g., "/dev/ttyACM0" on Linux, "COM3" on Windows)
///
/// # Returns
/// * `Ok(BaudRate)` - Negotiated rate
/// * `Err(TelemetryError)` - No rate worked
pub async fn detect_baud_rate(port: &str) -> Result<BaudRate, TelemetryError> {
    let mut factory = link::SerialSourceFactory::new(port, SerialConfig::default());
    BaudNegotiator::default()
        .negotiate(&mut factory, std::future::pending())
        .await
}
