//! # Logging Utilities
//!
//! Rate limiting and hex dump helpers for the decoding pipeline. On the
//! wrong baud rate, or on a noisy line, every character can be a diagnostic;
//! these helpers keep that from flooding the log.
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_link::util::logging::{LogThrottle, log_frame_hex};
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("Invalid byte received");
//! }
//!
//! log_frame_hex("Discarded window", &[0x7E, 0x01, 0x02]);
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last allowed one
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    ///
    /// # Arguments
    /// * `window_ms` - Time window in milliseconds
    /// * `cap` - Maximum messages allowed per window
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    ///
    /// Returns `true` if the message should be logged, `false` if it
    /// should be throttled.
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Number of messages dropped since the last call, resetting the tally
    pub fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

impl Default for LogThrottle {
    /// Five messages per second
    fn default() -> Self {
        Self::new(1000, 5)
    }
}

/// Log frame data in hex format for debugging
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!(target: "telemetry::frame", "{prefix}: {hex_str}{suffix}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_throttle_basic() {
        let mut throttle = LogThrottle::new(1000, 3);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(throttle.allow());

        // 4th message should be throttled
        assert!(!throttle.allow());
        assert!(!throttle.allow());
        assert_eq!(throttle.take_suppressed(), 2);
        assert_eq!(throttle.take_suppressed(), 0);
    }

    #[test]
    fn test_log_throttle_reset() {
        let mut throttle = LogThrottle::new(1000, 2);

        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());

        throttle.reset();
        assert!(throttle.allow());
        assert!(throttle.allow());
        assert!(!throttle.allow());
    }

    #[test]
    fn test_log_frame_hex_long_input() {
        let data = vec![0x7E; 100];
        log_frame_hex("long", &data); // Should not panic
    }
}
