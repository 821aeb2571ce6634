//! # Hex Encoding/Decoding Utilities
//!
//! Helpers around the `hex` crate shared by the decoder, the mock transport
//! and the log output.
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_link::util::hex::{encode_wire, format_hex_compact, hex_byte};
//!
//! let data = [0x7E, 0x01, 0x7E];
//! assert_eq!(encode_wire(&data), "7E 01 7E ");
//! assert_eq!(format_hex_compact(&data), "7e 01 7e");
//! assert_eq!(hex_byte("7e").unwrap(), 0x7E);
//! ```

use crate::constants::WIRE_DELIMITER;
use thiserror::Error;

/// Errors that can occur while turning hex text into bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Invalid hex character: {0:?}")]
    InvalidCharacter(char),

    /// A delimiter arrived after a number of digits other than two
    #[error("Expected 2 hex characters, got {0}")]
    OddLength(usize),
}

/// Convert a two character hex string to u8
///
/// Accepts both uppercase and lowercase digits.
pub fn hex_byte(hex: &str) -> Result<u8, HexError> {
    if hex.len() != 2 {
        return Err(HexError::OddLength(hex.chars().count()));
    }

    let mut out = [0u8; 1];
    hex::decode_to_slice(hex, &mut out).map_err(|_| {
        HexError::InvalidCharacter(hex.chars().find(|c| !c.is_ascii_hexdigit()).unwrap_or('?'))
    })?;
    Ok(out[0])
}

/// Encode bytes in the link's wire format: two uppercase hex digits
/// followed by a space, for every byte.
pub fn encode_wire(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for byte in data {
        out.push_str(&hex::encode_upper([*byte]));
        out.push(WIRE_DELIMITER as char);
    }
    out
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "7e 01 7e" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
