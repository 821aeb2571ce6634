//! # Utility Modules
//!
//! Common helpers used throughout the telemetry-link crate: hex
//! encoding/decoding and rate-limited logging.

pub mod hex;
pub mod logging;

pub use hex::{encode_wire, format_hex_compact, hex_byte, HexError};
pub use logging::{log_frame_hex, LogThrottle};
