//! # Serial Transport
//!
//! [`SerialByteSource`] wraps a `tokio_serial::SerialStream` behind the
//! [`ByteSource`] trait, and [`SerialSourceFactory`] opens one per baud
//! candidate. Port discovery matches USB descriptions against known board
//! names so the same binary works whichever port the board lands on.

use crate::constants::DEFAULT_READ_TIMEOUT;
use crate::error::TelemetryError;
use crate::link::source::{ByteSource, SourceFactory};
use async_trait::async_trait;
use log::{debug, info};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::{SerialPortBuilderExt, SerialPortType};

/// Configuration for serial connection.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Driver-level read timeout, also the poll bound of a single read
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A serial port opened at a fixed bit rate, 8N1.
pub struct SerialByteSource {
    port: Option<tokio_serial::SerialStream>,
    port_name: String,
    baudrate: u32,
}

impl SerialByteSource {
    /// Open `port_name` at `baudrate`.
    pub fn open(
        port_name: &str,
        baudrate: u32,
        config: &SerialConfig,
    ) -> Result<SerialByteSource, TelemetryError> {
        let port = tokio_serial::new(port_name, baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.read_timeout)
            .open_native_async()?;

        info!("Connected to {port_name} at {baudrate} baud");
        Ok(SerialByteSource {
            port: Some(port),
            port_name: port_name.to_string(),
            baudrate,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }
}

#[async_trait]
impl ByteSource for SerialByteSource {
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TelemetryError> {
        let port = self.port.as_mut().ok_or(TelemetryError::SourceClosed)?;
        let mut buf = [0u8; 1];
        match tokio::time::timeout(timeout, port.read(&mut buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(0)) => Err(TelemetryError::SourceClosed),
            Ok(Ok(_)) => Ok(Some(buf[0])),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Ok(Err(e)) => Err(TelemetryError::SerialPortError(e.to_string())),
        }
    }

    async fn close(&mut self) -> Result<(), TelemetryError> {
        // SerialStream has no close method; dropping it releases the port
        if self.port.take().is_some() {
            info!("Port {} closed", self.port_name);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

/// Opens [`SerialByteSource`]s on one port at whatever rate is asked for
#[derive(Debug, Clone)]
pub struct SerialSourceFactory {
    port_name: String,
    config: SerialConfig,
}

impl SerialSourceFactory {
    pub fn new(port_name: &str, config: SerialConfig) -> Self {
        SerialSourceFactory {
            port_name: port_name.to_string(),
            config,
        }
    }
}

#[async_trait]
impl SourceFactory for SerialSourceFactory {
    type Source = SerialByteSource;

    async fn open(&mut self, baudrate: u32) -> Result<SerialByteSource, TelemetryError> {
        SerialByteSource::open(&self.port_name, baudrate, &self.config)
    }
}

/// A serial port as seen by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescription {
    pub port_name: String,
    pub description: String,
}

/// Enumerate the serial ports present on this machine.
pub fn list_ports() -> Result<Vec<PortDescription>, TelemetryError> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let description = match &info.port_type {
                SerialPortType::UsbPort(usb) => {
                    let parts: Vec<&str> = [usb.manufacturer.as_deref(), usb.product.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect();
                    if parts.is_empty() {
                        format!("USB {:04x}:{:04x}", usb.vid, usb.pid)
                    } else {
                        parts.join(" ")
                    }
                }
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => "n/a".to_string(),
            };
            PortDescription {
                port_name: info.port_name,
                description,
            }
        })
        .collect())
}

/// First port whose description contains any of `patterns`.
pub fn find_matching_port<'a, P: AsRef<str>>(
    ports: &'a [PortDescription],
    patterns: &[P],
) -> Option<&'a PortDescription> {
    let found = ports.iter().find(|port| {
        patterns
            .iter()
            .any(|pattern| port.description.contains(pattern.as_ref()))
    });
    match found {
        Some(port) => debug!("Port {} matches: {}", port.port_name, port.description),
        None => debug!("No port matches {} candidates", ports.len()),
    }
    found
}
