//! Frame assembler
//!
//! State machine that turns a stream of decoded bytes into eight byte
//! windows. Noise before a start delimiter is skipped; once a window is
//! full it is handed over whether or not it ends on a delimiter, and the
//! buffer starts over. Overlapping windows are never retried.
//!
//! The payload is not byte-stuffed, so a stray `0x7E` in the noise can
//! open a false window. The interpreter rejects most of these through the
//! end delimiter and the checksum.

use crate::constants::{FRAME_DELIMITER, FRAME_LEN};
use crate::link::frame::{Frame, FrameError};

/// Fixed 8-slot buffer with an explicit fill count
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    buf: [u8; FRAME_LEN],
    len: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one byte.
    ///
    /// Returns `Ok(Some(frame))` when the eighth byte completes a window,
    /// `Ok(None)` while collecting or skipping noise, and
    /// `Err(FrameError::Misaligned)` when the buffered bytes turn out not to
    /// start with the delimiter, in which case they and `byte` are dropped.
    pub fn push(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.len == 0 && byte != FRAME_DELIMITER {
            return Ok(None);
        }

        if self.len > 0 && self.buf[0] != FRAME_DELIMITER {
            self.reset();
            return Err(FrameError::Misaligned);
        }

        self.buf[self.len] = byte;
        self.len += 1;

        if self.len == FRAME_LEN {
            self.len = 0;
            return Ok(Some(Frame(self.buf)));
        }
        Ok(None)
    }

    /// Bytes collected towards the current window
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }
}
