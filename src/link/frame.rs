//! # Telemetry Frame Interpreter
//!
//! A frame is exactly eight bytes on the wire:
//!
//! ```text
//! 7E | type | id | query | data | crcHi | crcLo | 7E
//! ```
//!
//! The CRC-16/CCITT-FALSE covers `type`, `id`, `query` and `data`.
//! [`interpret`] turns an assembled frame into a [`DecodedReading`]. A
//! checksum mismatch is not an error here: the reading is still produced,
//! tagged with the expected checksum, so the operator can see what arrived.
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_link::link::frame::{interpret, DeviceKind, Frame};
//!
//! let frame = Frame::build(0x01, 0x01, 0x11, 25);
//! let reading = interpret(&frame).unwrap();
//! assert_eq!(reading.device, DeviceKind::Temperature);
//! assert!(reading.checksum.is_ok());
//! ```

use crate::constants::{
    DEVICE_TYPE_HUMIDITY, DEVICE_TYPE_TEMPERATURE, FRAME_DELIMITER, FRAME_LEN,
    FRAME_OFFSET_CRC_HI, FRAME_OFFSET_CRC_LO, FRAME_OFFSET_DATA, FRAME_OFFSET_END,
    FRAME_OFFSET_ID, FRAME_OFFSET_QUERY, FRAME_OFFSET_TYPE,
};
use crate::link::crc::crc16;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Structural problems with an assembled window. These are absorbed by the
/// decoding session; the stream resynchronises on the next start delimiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffered bytes did not begin with the start delimiter.
    #[error("Frame does not start with 0x7E")]
    Misaligned,

    /// The eighth byte of the window is not the end delimiter.
    #[error("Invalid frame: missing end delimiter (got 0x{0:02X})")]
    MissingEndDelimiter(u8),
}

/// An eight byte window handed over by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame(pub [u8; FRAME_LEN]);

impl Frame {
    /// Build a well-formed frame with both delimiters and the correct CRC.
    pub fn build(device_type: u8, device_id: u8, query: u8, data: u8) -> Frame {
        let crc = crc16(&[device_type, device_id, query, data]);
        let [crc_hi, crc_lo] = crc.to_be_bytes();
        Frame([
            FRAME_DELIMITER,
            device_type,
            device_id,
            query,
            data,
            crc_hi,
            crc_lo,
            FRAME_DELIMITER,
        ])
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The four checksummed bytes: type, id, query, data
    pub fn payload(&self) -> &[u8] {
        &self.0[FRAME_OFFSET_TYPE..=FRAME_OFFSET_DATA]
    }

    /// Checksum as transmitted, high byte first
    pub fn transmitted_crc(&self) -> u16 {
        u16::from_be_bytes([self.0[FRAME_OFFSET_CRC_HI], self.0[FRAME_OFFSET_CRC_LO]])
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Frame(bytes)
    }
}

/// Sensor classification of the `type` byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "raw_type", rename_all = "snake_case")]
pub enum DeviceKind {
    Temperature,
    Humidity,
    Unknown(u8),
}

impl DeviceKind {
    pub fn from_type_byte(device_type: u8) -> Self {
        match device_type {
            DEVICE_TYPE_TEMPERATURE => DeviceKind::Temperature,
            DEVICE_TYPE_HUMIDITY => DeviceKind::Humidity,
            other => DeviceKind::Unknown(other),
        }
    }

    pub fn type_byte(&self) -> u8 {
        match self {
            DeviceKind::Temperature => DEVICE_TYPE_TEMPERATURE,
            DeviceKind::Humidity => DEVICE_TYPE_HUMIDITY,
            DeviceKind::Unknown(raw) => *raw,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Temperature => write!(f, "01-temperature"),
            DeviceKind::Humidity => write!(f, "02-humidity"),
            DeviceKind::Unknown(raw) => write!(f, "{raw:#04x}-unknown"),
        }
    }
}

/// Outcome of comparing the transmitted CRC with the recomputed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChecksumStatus {
    Ok,
    Mismatch { expected: u16, received: u16 },
}

impl ChecksumStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ChecksumStatus::Ok)
    }
}

impl fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumStatus::Ok => write!(f, "ok"),
            ChecksumStatus::Mismatch { expected, .. } => {
                write!(f, "mismatch (expected {expected:#06x})")
            }
        }
    }
}

/// Fields of a structurally valid frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedReading {
    pub device: DeviceKind,
    pub device_id: u8,
    /// Passed through unchanged, the protocol assigns it no meaning yet
    pub query: u8,
    /// Raw sensor value
    pub data: u8,
    pub checksum: ChecksumStatus,
}

impl DecodedReading {
    /// Human-readable description of the data byte for this device kind
    pub fn describe_data(&self) -> String {
        match self.device {
            DeviceKind::Temperature => format!("temperature: {} °C", self.data),
            DeviceKind::Humidity => format!("relative humidity: {} %", self.data),
            DeviceKind::Unknown(_) => format!("data: {}", self.data),
        }
    }
}

impl fmt::Display for DecodedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device: {}, id: {:02}, {}, checksum: {}",
            self.device,
            self.device_id,
            self.describe_data(),
            self.checksum
        )
    }
}

/// Interpret an assembled window.
///
/// Fails only when the end delimiter is missing. The start delimiter is
/// guaranteed by the assembler.
pub fn interpret(frame: &Frame) -> Result<DecodedReading, FrameError> {
    let bytes = frame.as_bytes();
    if bytes[FRAME_OFFSET_END] != FRAME_DELIMITER {
        return Err(FrameError::MissingEndDelimiter(bytes[FRAME_OFFSET_END]));
    }

    let received = frame.transmitted_crc();
    let expected = crc16(frame.payload());
    let checksum = if expected == received {
        ChecksumStatus::Ok
    } else {
        ChecksumStatus::Mismatch { expected, received }
    };

    Ok(DecodedReading {
        device: DeviceKind::from_type_byte(bytes[FRAME_OFFSET_TYPE]),
        device_id: bytes[FRAME_OFFSET_ID],
        query: bytes[FRAME_OFFSET_QUERY],
        data: bytes[FRAME_OFFSET_DATA],
        checksum,
    })
}
