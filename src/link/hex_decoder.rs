//! ASCII-hex byte decoder
//!
//! The link carries every protocol byte as two hex digits followed by a
//! space. [`AsciiHexDecoder`] is fed the raw characters one at a time and
//! yields a byte whenever a space closes exactly two valid digits.

use crate::constants::WIRE_DELIMITER;
use crate::util::hex::{hex_byte, HexError};

/// Pending-digit accumulator.
///
/// Only the first two characters are kept; `len` still counts everything
/// seen since the last delimiter so that over-long groups are rejected.
#[derive(Debug, Default, Clone)]
pub struct AsciiHexDecoder {
    pending: [u8; 2],
    len: usize,
}

impl AsciiHexDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw character.
    ///
    /// Returns `Ok(Some(byte))` when a delimiter completes a valid pair,
    /// `Ok(None)` while accumulating (or for an empty group), and an error
    /// when a delimiter closes a malformed group. The accumulator is
    /// cleared on every delimiter either way.
    ///
    /// Bytes outside 7-bit ASCII are ignored, they never reach the
    /// accumulator.
    pub fn feed(&mut self, raw: u8) -> Result<Option<u8>, HexError> {
        if !raw.is_ascii() {
            return Ok(None);
        }

        if raw != WIRE_DELIMITER {
            if self.len < self.pending.len() {
                self.pending[self.len] = raw;
            }
            self.len = self.len.saturating_add(1);
            return Ok(None);
        }

        let len = std::mem::take(&mut self.len);
        match len {
            0 => Ok(None),
            2 => {
                // Both slots hold ASCII, so this is valid UTF-8
                let digits = std::str::from_utf8(&self.pending)
                    .map_err(|_| HexError::InvalidCharacter('?'))?;
                hex_byte(digits).map(Some)
            }
            n => Err(HexError::OddLength(n)),
        }
    }

    /// Number of characters collected since the last delimiter
    pub fn pending_len(&self) -> usize {
        self.len
    }

    /// Drop any partially collected digits
    pub fn reset(&mut self) {
        self.len = 0;
    }
}
