//! Byte source abstraction
//!
//! The decoding pipeline only needs a character stream with a bounded
//! read. Real serial ports and the in-memory mock both implement
//! [`ByteSource`]; [`SourceFactory`] opens one at a given bit rate so the
//! baud negotiator can probe candidates.

use crate::error::TelemetryError;
use async_trait::async_trait;
use std::time::Duration;

/// A readable, closable character stream
#[async_trait]
pub trait ByteSource: Send {
    /// Wait at most `timeout` for the next raw byte.
    ///
    /// `Ok(None)` means nothing arrived in time. End of stream is reported
    /// as `Err(TelemetryError::SourceClosed)`.
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TelemetryError>;

    /// Release the underlying resource. Closing an already closed source is
    /// a no-op.
    async fn close(&mut self) -> Result<(), TelemetryError>;

    fn is_open(&self) -> bool;
}

/// Opens byte sources at a requested bit rate
#[async_trait]
pub trait SourceFactory: Send {
    type Source: ByteSource;

    async fn open(&mut self, baudrate: u32) -> Result<Self::Source, TelemetryError>;
}
