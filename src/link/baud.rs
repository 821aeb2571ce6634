//! # Baud Rate Negotiation
//!
//! The sensor board's bit rate is not known in advance. The negotiator
//! opens the source at each candidate rate in turn, lowest first, and runs a
//! fresh decoding session against it for a bounded window. The first rate
//! that yields a checksum-valid frame wins and no further candidates are
//! tried.
//!
//! At a wrong rate the UART produces framing garbage: mostly non-ASCII
//! bytes and stray digits, which never assemble into a frame whose CRC
//! matches.

use crate::constants::{DEFAULT_PROBE_WINDOW, DEFAULT_READ_TIMEOUT};
use crate::error::TelemetryError;
use crate::link::session::DecodingSession;
use crate::link::source::{ByteSource, SourceFactory};
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Standard serial bit rates, probed in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaudRate {
    Baud300,
    Baud1200,
    Baud2400,
    Baud4800,
    Baud9600,
    Baud19200,
    Baud38400,
    Baud57600,
    Baud115200,
}

impl BaudRate {
    /// Probe order, low to high
    pub const ALL_RATES: [BaudRate; 9] = [
        BaudRate::Baud300,
        BaudRate::Baud1200,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud19200,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
    ];

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::Baud300 => 300,
            BaudRate::Baud1200 => 1200,
            BaudRate::Baud2400 => 2400,
            BaudRate::Baud4800 => 4800,
            BaudRate::Baud9600 => 9600,
            BaudRate::Baud19200 => 19200,
            BaudRate::Baud38400 => 38400,
            BaudRate::Baud57600 => 57600,
            BaudRate::Baud115200 => 115200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = TelemetryError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        BaudRate::ALL_RATES
            .iter()
            .copied()
            .find(|rate| rate.as_u32() == value)
            .ok_or_else(|| TelemetryError::InvalidConfig(format!("unsupported baud rate {value}")))
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Configuration for baud negotiation.
#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    pub candidates: Vec<BaudRate>,
    /// Time each candidate gets to deliver a valid frame
    pub window: Duration,
    /// Upper bound of a single read inside the window
    pub read_timeout: Duration,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        NegotiationConfig {
            candidates: BaudRate::ALL_RATES.to_vec(),
            window: DEFAULT_PROBE_WINDOW,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl NegotiationConfig {
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.candidates.is_empty() {
            return Err(TelemetryError::InvalidConfig(
                "no baud candidates to probe".into(),
            ));
        }
        if self.window.is_zero() || self.read_timeout.is_zero() {
            return Err(TelemetryError::InvalidConfig(
                "probe window and read timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Greedy, ordered, first-success prober
#[derive(Debug, Clone, Default)]
pub struct BaudNegotiator {
    config: NegotiationConfig,
}

impl BaudNegotiator {
    pub fn new(config: NegotiationConfig) -> Self {
        BaudNegotiator { config }
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Probe the configured candidates in order and return the first one
    /// that produces a checksum-valid frame.
    ///
    /// A candidate whose source fails to open or read is skipped. Every
    /// source that was opened is closed before moving on or returning,
    /// including when `shutdown` fires, which ends negotiation with
    /// `TelemetryError::Interrupted`.
    pub async fn negotiate<Fa, Sh>(
        &self,
        factory: &mut Fa,
        shutdown: Sh,
    ) -> Result<BaudRate, TelemetryError>
    where
        Fa: SourceFactory,
        Sh: Future<Output = ()>,
    {
        self.config.validate()?;
        tokio::pin!(shutdown);

        info!("Detecting baud rate...");
        for &candidate in &self.config.candidates {
            let mut source = match factory.open(candidate.as_u32()).await {
                Ok(source) => source,
                Err(e) => {
                    warn!("Error opening source at {candidate} baud: {e}");
                    continue;
                }
            };
            info!("Probing {candidate} baud");

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => Err(TelemetryError::Interrupted),
                res = probe(&mut source, self.config.window, self.config.read_timeout) => res,
            };

            if let Err(e) = source.close().await {
                warn!("Error closing source at {candidate} baud: {e}");
            }

            match outcome {
                Ok(true) => {
                    info!("Baud rate detected: {candidate}");
                    return Ok(candidate);
                }
                Ok(false) => {
                    debug!(
                        "No valid frame at {candidate} baud within {:?}",
                        self.config.window
                    );
                }
                Err(TelemetryError::Interrupted) => {
                    info!("Baud detection interrupted");
                    return Err(TelemetryError::Interrupted);
                }
                Err(e) => warn!("Read error at {candidate} baud: {e}"),
            }
        }

        warn!("Could not detect a baud rate");
        Err(TelemetryError::NoBaudFound {
            tried: self.config.candidates.len(),
        })
    }
}

/// Run a fresh session against `source` until a checksum-valid frame
/// arrives (`true`) or `window` elapses (`false`).
async fn probe<S: ByteSource>(
    source: &mut S,
    window: Duration,
    read_timeout: Duration,
) -> Result<bool, TelemetryError> {
    let mut session = DecodingSession::for_probe();
    let deadline = Instant::now() + window;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        let wait = (deadline - now).min(read_timeout);
        if let Some(raw) = source.read_byte(wait).await? {
            if let Some(Ok(reading)) = session.feed(raw) {
                if reading.checksum.is_ok() {
                    debug!("Probe accepted frame: {reading}");
                    return Ok(true);
                }
            }
        }
    }
}
