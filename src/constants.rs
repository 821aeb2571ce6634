//! Telemetry Link Protocol Constants
//!
//! This module defines the constants of the framed telemetry protocol:
//! delimiters, frame geometry, device type codes and negotiation defaults.

use std::time::Duration;

/// Start and end delimiter of every frame
pub const FRAME_DELIMITER: u8 = 0x7E;

/// Fixed frame length: START, type, id, query, data, crcHi, crcLo, END
pub const FRAME_LEN: usize = 8;

// ----------------------------------------------------------------------------
// Frame field offsets
// ----------------------------------------------------------------------------

pub const FRAME_OFFSET_TYPE: usize = 1;
pub const FRAME_OFFSET_ID: usize = 2;
pub const FRAME_OFFSET_QUERY: usize = 3;
pub const FRAME_OFFSET_DATA: usize = 4;
pub const FRAME_OFFSET_CRC_HI: usize = 5;
pub const FRAME_OFFSET_CRC_LO: usize = 6;
pub const FRAME_OFFSET_END: usize = 7;

// ----------------------------------------------------------------------------
// Device types
// ----------------------------------------------------------------------------

/// Temperature sensor, data byte is degrees Celsius
pub const DEVICE_TYPE_TEMPERATURE: u8 = 0x01;

/// Humidity sensor, data byte is relative humidity in percent
pub const DEVICE_TYPE_HUMIDITY: u8 = 0x02;

// ----------------------------------------------------------------------------
// CRC-16/CCITT-FALSE parameters
// ----------------------------------------------------------------------------

pub const CRC16_INIT: u16 = 0xFFFF;
pub const CRC16_POLY: u16 = 0x1021;

// ----------------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------------

/// Separator written after every pair of hex digits
pub const WIRE_DELIMITER: u8 = b' ';

// ----------------------------------------------------------------------------
// Negotiation and transport defaults
// ----------------------------------------------------------------------------

/// Time a single baud candidate gets to produce a checksum-valid frame
pub const DEFAULT_PROBE_WINDOW: Duration = Duration::from_secs(2);

/// Upper bound of one blocking read, keeps windows and interrupts responsive
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// USB descriptions that identify the sensor board
pub const DEFAULT_PORT_PATTERNS: &[&str] = &["Arduino", "CH340"];
