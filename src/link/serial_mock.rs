//! Mock byte source for testing
//!
//! Scripted, in-memory stand-ins for a serial port so negotiation and
//! live decoding can be exercised without hardware. Clones share state,
//! which lets a test keep a handle on a source after handing it to the
//! code under test and inspect it afterwards.

use crate::error::TelemetryError;
use crate::link::frame::Frame;
use crate::link::source::{ByteSource, SourceFactory};
use crate::util::hex::encode_wire;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock source that replays queued bytes
#[derive(Clone, Debug)]
pub struct MockByteSource {
    /// Data to be read from the source
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Number of `close` calls, including redundant ones
    pub close_count: Arc<Mutex<usize>>,
    open: Arc<Mutex<bool>>,
    /// Report end of stream once the queue is drained instead of idling
    end_when_drained: bool,
    /// Error returned by the next read
    next_error: Arc<Mutex<Option<TelemetryError>>>,
}

impl Default for MockByteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockByteSource {
    /// Source that idles (read timeouts) once its queue is empty
    pub fn new() -> Self {
        MockByteSource {
            rx_buffer: Arc::new(Mutex::new(VecDeque::new())),
            close_count: Arc::new(Mutex::new(0)),
            open: Arc::new(Mutex::new(true)),
            end_when_drained: false,
            next_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Source that reports end of stream once its queue is empty
    pub fn ending() -> Self {
        MockByteSource {
            end_when_drained: true,
            ..Self::new()
        }
    }

    /// Queue raw bytes to be read
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_buffer).extend(data);
    }

    /// Queue a frame in wire format
    pub fn queue_frame(&self, frame: &Frame) {
        self.queue_rx_data(encode_wire(frame.as_bytes()).as_bytes());
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: TelemetryError) {
        *lock(&self.next_error) = Some(error);
    }

    pub fn closes(&self) -> usize {
        *lock(&self.close_count)
    }

    pub fn remaining(&self) -> usize {
        lock(&self.rx_buffer).len()
    }
}

#[async_trait]
impl ByteSource for MockByteSource {
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, TelemetryError> {
        if !self.is_open() {
            return Err(TelemetryError::SourceClosed);
        }
        if let Some(error) = lock(&self.next_error).take() {
            return Err(error);
        }

        let next = lock(&self.rx_buffer).pop_front();
        match next {
            Some(byte) => Ok(Some(byte)),
            None if self.end_when_drained => Err(TelemetryError::SourceClosed),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), TelemetryError> {
        *lock(&self.open) = false;
        *lock(&self.close_count) += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        *lock(&self.open)
    }
}

/// Factory handing out scripted sources per baud rate.
///
/// Rates with a script replay it; every other rate replays `noise`.
#[derive(Clone, Debug, Default)]
pub struct MockSourceFactory {
    scripts: HashMap<u32, Vec<u8>>,
    noise: Vec<u8>,
    failing: HashSet<u32>,
    /// Rates requested, in order
    pub opened: Arc<Mutex<Vec<u32>>>,
    /// Every source handed out, in order
    pub sources: Arc<Mutex<Vec<MockByteSource>>>,
}

impl MockSourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes replayed at `baudrate`
    pub fn with_script(mut self, baudrate: u32, data: &[u8]) -> Self {
        self.scripts.insert(baudrate, data.to_vec());
        self
    }

    /// Bytes replayed at any rate without a script
    pub fn with_noise(mut self, data: &[u8]) -> Self {
        self.noise = data.to_vec();
        self
    }

    /// Opening at `baudrate` fails
    pub fn with_failing_rate(mut self, baudrate: u32) -> Self {
        self.failing.insert(baudrate);
        self
    }

    pub fn opened_rates(&self) -> Vec<u32> {
        lock(&self.opened).clone()
    }

    pub fn handed_out(&self) -> Vec<MockByteSource> {
        lock(&self.sources).clone()
    }
}

#[async_trait]
impl SourceFactory for MockSourceFactory {
    type Source = MockByteSource;

    async fn open(&mut self, baudrate: u32) -> Result<MockByteSource, TelemetryError> {
        lock(&self.opened).push(baudrate);
        if self.failing.contains(&baudrate) {
            return Err(TelemetryError::SerialPortError(format!(
                "mock open failure at {baudrate}"
            )));
        }

        let source = MockByteSource::new();
        source.queue_rx_data(self.scripts.get(&baudrate).unwrap_or(&self.noise));
        lock(&self.sources).push(source.clone());
        Ok(source)
    }
}
