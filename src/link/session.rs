//! # Decoding Session
//!
//! Chains the ASCII-hex decoder, the frame assembler and the interpreter
//! into one value that owns all decoding state. A session is cheap to build
//! and is never reused across bit rates: the negotiator creates a fresh one
//! for every probe, and the live phase gets its own.
//!
//! Byte and frame anomalies are counted and logged here instead of being
//! raised; the stream recovers by itself at the next start delimiter.

use crate::error::TelemetryError;
use crate::link::assembler::FrameAssembler;
use crate::link::frame::{interpret, DecodedReading, FrameError};
use crate::link::hex_decoder::AsciiHexDecoder;
use crate::link::source::ByteSource;
use crate::util::logging::{log_frame_hex, LogThrottle};
use log::{debug, info, log, warn, Level};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Counters kept by a [`DecodingSession`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Raw characters pulled from the source
    pub bytes_received: u64,
    /// Hex groups dropped for bad digits or wrong length
    pub malformed_bytes: u64,
    /// Buffers discarded for not starting with the delimiter
    pub misaligned_windows: u64,
    /// Windows without an end delimiter
    pub invalid_frames: u64,
    pub valid_readings: u64,
    pub checksum_mismatches: u64,
}

impl SessionStats {
    /// Readings surfaced, with or without a checksum mismatch
    pub fn readings(&self) -> u64 {
        self.valid_readings + self.checksum_mismatches
    }
}

/// Decoder, assembler and counters for one stream at one bit rate
#[derive(Debug)]
pub struct DecodingSession {
    decoder: AsciiHexDecoder,
    assembler: FrameAssembler,
    stats: SessionStats,
    throttle: LogThrottle,
    anomaly_level: Level,
}

impl Default for DecodingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodingSession {
    /// Session for live decoding, anomalies are logged as warnings
    pub fn new() -> Self {
        DecodingSession {
            decoder: AsciiHexDecoder::new(),
            assembler: FrameAssembler::new(),
            stats: SessionStats::default(),
            throttle: LogThrottle::default(),
            anomaly_level: Level::Warn,
        }
    }

    /// Session for a baud probe. A wrong rate produces nothing but
    /// garbage, so anomalies only go to the debug log.
    pub fn for_probe() -> Self {
        DecodingSession {
            anomaly_level: Level::Debug,
            ..Self::new()
        }
    }

    /// Feed one raw character through the pipeline.
    ///
    /// Returns `None` until an eight byte window completes (or a buffer is
    /// discarded), then the interpreter's verdict. Readings with a checksum
    /// mismatch are returned as `Ok` and flagged in their `checksum` field.
    pub fn feed(&mut self, raw: u8) -> Option<Result<DecodedReading, FrameError>> {
        self.stats.bytes_received += 1;

        let byte = match self.decoder.feed(raw) {
            Ok(Some(byte)) => byte,
            Ok(None) => return None,
            Err(e) => {
                self.stats.malformed_bytes += 1;
                self.report(&format!("Invalid byte dropped: {e}"));
                return None;
            }
        };

        let frame = match self.assembler.push(byte) {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                self.stats.misaligned_windows += 1;
                self.report(&format!("Ignored: {e}"));
                return Some(Err(e));
            }
        };

        log_frame_hex("Assembled window", frame.as_bytes());

        match interpret(&frame) {
            Ok(reading) => {
                if reading.checksum.is_ok() {
                    self.stats.valid_readings += 1;
                } else {
                    self.stats.checksum_mismatches += 1;
                    debug!("Checksum mismatch: {}", reading.checksum);
                }
                Some(Ok(reading))
            }
            Err(e) => {
                self.stats.invalid_frames += 1;
                self.report(&e.to_string());
                Some(Err(e))
            }
        }
    }

    /// Feed a slice of raw characters, collecting every reading produced
    pub fn feed_all(&mut self, raw: &[u8]) -> Vec<DecodedReading> {
        raw.iter()
            .filter_map(|b| self.feed(*b))
            .filter_map(Result::ok)
            .collect()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn report(&mut self, message: &str) {
        if self.anomaly_level > Level::Warn || self.throttle.allow() {
            log!(self.anomaly_level, "{message}");
        } else {
            debug!("{message}");
        }
    }
}

/// Decode `source` until `shutdown` resolves or the source ends.
///
/// There is no overall timeout; `read_timeout` only bounds each read so the
/// interrupt stays responsive. The source is closed on every exit path.
pub async fn run_live<S, F, R>(
    source: &mut S,
    read_timeout: Duration,
    shutdown: F,
    mut on_reading: R,
) -> Result<SessionStats, TelemetryError>
where
    S: ByteSource,
    F: Future<Output = ()>,
    R: FnMut(&DecodedReading),
{
    let mut session = DecodingSession::new();

    let result = {
        let decode = pump(source, &mut session, read_timeout, &mut on_reading);
        tokio::select! {
            biased;
            _ = shutdown => {
                info!("Reading interrupted by user");
                Ok(())
            }
            res = decode => res,
        }
    };

    let closed = source.close().await;
    let stats = session.stats();
    info!(
        "Session ended: {} readings ({} checksum mismatches), {} malformed bytes, {} invalid frames",
        stats.readings(),
        stats.checksum_mismatches,
        stats.malformed_bytes,
        stats.invalid_frames
    );

    if let Err(e) = &result {
        warn!("Error while reading: {e}");
    }
    result?;
    closed?;
    Ok(stats)
}

async fn pump<S, R>(
    source: &mut S,
    session: &mut DecodingSession,
    read_timeout: Duration,
    on_reading: &mut R,
) -> Result<(), TelemetryError>
where
    S: ByteSource,
    R: FnMut(&DecodedReading),
{
    loop {
        match source.read_byte(read_timeout).await {
            Ok(Some(raw)) => {
                if let Some(Ok(reading)) = session.feed(raw) {
                    on_reading(&reading);
                }
            }
            Ok(None) => continue,
            Err(TelemetryError::SourceClosed) => {
                info!("Byte source closed");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::frame::{ChecksumStatus, DeviceKind, Frame};
    use crate::util::hex::encode_wire;

    #[test]
    fn test_decodes_wire_frame() {
        let mut session = DecodingSession::new();
        let wire = encode_wire(Frame::build(0x01, 0x01, 0x11, 0x19).as_bytes());
        let readings = session.feed_all(wire.as_bytes());

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].device, DeviceKind::Temperature);
        assert_eq!(readings[0].data, 0x19);
        assert_eq!(readings[0].checksum, ChecksumStatus::Ok);
        assert_eq!(session.stats().bytes_received, wire.len() as u64);
    }

    #[test]
    fn test_counts_anomalies() {
        let mut session = DecodingSession::new();
        // one malformed group, then a window with a bad end delimiter
        session.feed_all(b"7G 7E 01 01 11 19 76 1E 00 ");
        let stats = session.stats();
        assert_eq!(stats.malformed_bytes, 1);
        assert_eq!(stats.invalid_frames, 1);
        assert_eq!(stats.readings(), 0);
    }

    #[test]
    fn test_counts_mismatches() {
        let mut session = DecodingSession::for_probe();
        let readings = session.feed_all(b"7E 01 01 11 19 3A 4F 7E ");
        assert_eq!(readings.len(), 1);
        assert!(!readings[0].checksum.is_ok());
        assert_eq!(session.stats().checksum_mismatches, 1);
        assert_eq!(session.stats().valid_readings, 0);
    }
}
