//! # Runtime Configuration
//!
//! All timeouts and limits have sane defaults with environment overrides.

use pipeline_buffer::BufferConfig;
use std::time::Duration;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Which buffer variant to run.
    pub buffer: BufferConfig,
    /// How long to wait for the stage to confirm close before aborting.
    pub shutdown_timeout: Duration,
    /// Capacity of the producer → stage channel.
    pub inbound_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            shutdown_timeout: Duration::from_millis(5000),
            inbound_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PIPELINE_BUFFER_TYPE`: Buffer variant (default: none)
    /// - `PIPELINE_SHUTDOWN_TIMEOUT_MS`: Close wait in milliseconds (default: 5000)
    /// - `PIPELINE_INBOUND_CAPACITY`: Producer channel capacity (default: 64)
    pub fn from_env() -> Self {
        let mut config = Self {
            buffer: BufferConfig::from_env(),
            ..Self::default()
        };

        if let Ok(raw) = std::env::var("PIPELINE_SHUTDOWN_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.shutdown_timeout = Duration::from_millis(ms),
                Err(_) => warn!(value = %raw, "Ignoring invalid PIPELINE_SHUTDOWN_TIMEOUT_MS"),
            }
        }

        if let Ok(raw) = std::env::var("PIPELINE_INBOUND_CAPACITY") {
            match raw.parse::<usize>() {
                // tokio channels reject a zero capacity
                Ok(capacity) if capacity > 0 => config.inbound_capacity = capacity,
                _ => warn!(value = %raw, "Ignoring invalid PIPELINE_INBOUND_CAPACITY"),
            }
        }

        config
    }
}
