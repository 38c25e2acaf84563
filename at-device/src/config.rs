//! Device configuration

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::engine::EngineSettings;
use at_core::{AtError, AtResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration applied by [`Device::init`](crate::device::Device::init)
///
/// Deserializable from any serde format, e.g.
/// `{"read_timeout_ms": 100, "buffer_capacity": 512}`. Missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Per-read timeout pushed down to the transport, in milliseconds.
    /// `None` leaves the transport's own setting untouched.
    pub read_timeout_ms: Option<u64>,
    /// Accumulation buffer capacity in bytes
    pub buffer_capacity: usize,
}

impl DeviceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-read timeout
    ///
    /// Stored with millisecond granularity: a non-zero fraction of a
    /// millisecond rounds up, and durations beyond `u64::MAX` ms saturate.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let rounds_up = timeout.subsec_nanos() % 1_000_000 != 0;
        self.read_timeout_ms = Some(if rounds_up { millis.saturating_add(1) } else { millis });
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> AtResult<()> {
        if self.buffer_capacity == 0 {
            return Err(AtError::Config(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.read_timeout_ms == Some(0) {
            return Err(AtError::Config(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            buffer_capacity: self.buffer_capacity,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}
