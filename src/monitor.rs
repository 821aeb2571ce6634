//! # Telemetry Monitor
//!
//! This module provides the TelemetryMonitor struct, the main entry point
//! for talking to a sensor board: it resolves the serial port, negotiates
//! the bit rate when it is not configured, and then decodes readings until
//! interrupted or the link goes away.

use crate::constants::DEFAULT_PORT_PATTERNS;
use crate::error::TelemetryError;
use crate::link::baud::{BaudNegotiator, BaudRate, NegotiationConfig};
use crate::link::frame::DecodedReading;
use crate::link::serial::{find_matching_port, list_ports, SerialConfig, SerialSourceFactory};
use crate::link::session::{run_live, SessionStats};
use crate::link::source::SourceFactory;
use log::{info, warn};
use std::future::Future;

/// Everything needed to bring a link up.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Serial port; detected from `port_patterns` when absent
    pub port: Option<String>,
    /// Fixed bit rate; negotiated when absent
    pub baudrate: Option<u32>,
    pub serial: SerialConfig,
    pub negotiation: NegotiationConfig,
    /// Substrings of USB descriptions that identify the board
    pub port_patterns: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            port: None,
            baudrate: None,
            serial: SerialConfig::default(),
            negotiation: NegotiationConfig::default(),
            port_patterns: DEFAULT_PORT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Outcome of a completed live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub baudrate: u32,
    pub stats: SessionStats,
}

pub struct TelemetryMonitor {
    config: MonitorConfig,
}

impl TelemetryMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self, TelemetryError> {
        match config.baudrate {
            Some(0) => {
                return Err(TelemetryError::InvalidConfig(
                    "baud rate must be non-zero".into(),
                ))
            }
            Some(_) => {}
            None => config.negotiation.validate()?,
        }
        if config.serial.read_timeout.is_zero() {
            return Err(TelemetryError::InvalidConfig(
                "read timeout must be non-zero".into(),
            ));
        }
        Ok(TelemetryMonitor { config })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The configured port, or the first enumerated port whose description
    /// matches a known board. `None` when neither is available.
    pub fn resolve_port(&self) -> Result<Option<String>, TelemetryError> {
        if let Some(port) = &self.config.port {
            return Ok(Some(port.clone()));
        }

        info!("Searching for available serial ports");
        let ports = list_ports()?;
        match find_matching_port(&ports, self.config.port_patterns.as_slice()) {
            Some(port) => {
                info!(
                    "Port detected automatically: {} - {}",
                    port.port_name, port.description
                );
                Ok(Some(port.port_name.clone()))
            }
            None => {
                warn!("No port with a known board was found");
                Ok(None)
            }
        }
    }

    /// Factory opening the real serial port `port_name`
    pub fn serial_factory(&self, port_name: &str) -> SerialSourceFactory {
        SerialSourceFactory::new(port_name, self.config.serial.clone())
    }

    /// Probe the configured candidates on `factory`.
    pub async fn detect_baud<Fa, Sh>(
        &self,
        factory: &mut Fa,
        shutdown: Sh,
    ) -> Result<BaudRate, TelemetryError>
    where
        Fa: SourceFactory,
        Sh: Future<Output = ()>,
    {
        BaudNegotiator::new(self.config.negotiation.clone())
            .negotiate(factory, shutdown)
            .await
    }

    /// Negotiate (unless a rate is configured), then decode until
    /// `shutdown` resolves or the source ends. Each reading is passed to
    /// `on_reading`, checksum mismatches included.
    pub async fn run<Fa, Sh, R>(
        &self,
        factory: &mut Fa,
        shutdown: Sh,
        on_reading: R,
    ) -> Result<SessionReport, TelemetryError>
    where
        Fa: SourceFactory,
        Sh: Future<Output = ()>,
        R: FnMut(&DecodedReading),
    {
        tokio::pin!(shutdown);

        let baudrate = match self.config.baudrate {
            Some(baudrate) => baudrate,
            None => self.detect_baud(factory, &mut shutdown).await?.as_u32(),
        };

        let mut source = factory.open(baudrate).await?;
        let stats = run_live(
            &mut source,
            self.config.serial.read_timeout,
            &mut shutdown,
            on_reading,
        )
        .await?;

        Ok(SessionReport { baudrate, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_config() {
        let zero_baud = MonitorConfig {
            baudrate: Some(0),
            ..Default::default()
        };
        assert!(TelemetryMonitor::new(zero_baud).is_err());

        let no_candidates = MonitorConfig {
            negotiation: NegotiationConfig {
                candidates: vec![],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(TelemetryMonitor::new(no_candidates).is_err());

        // Candidates are irrelevant once the rate is fixed
        let fixed = MonitorConfig {
            baudrate: Some(9600),
            negotiation: NegotiationConfig {
                candidates: vec![],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(TelemetryMonitor::new(fixed).is_ok());
    }

    #[test]
    fn test_configured_port_wins() {
        let monitor = TelemetryMonitor::new(MonitorConfig {
            port: Some("/dev/ttyACM3".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(monitor.resolve_port().unwrap().as_deref(), Some("/dev/ttyACM3"));
    }

    #[test]
    fn test_default_patterns() {
        let config = MonitorConfig::default();
        assert_eq!(config.port_patterns, vec!["Arduino", "CH340"]);
    }
}
