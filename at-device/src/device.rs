//! AT device lifecycle
//!
//! A [`Device`] is a named AT module sitting on one transport. It is
//! initialised once with a [`DeviceConfig`], then driven with
//! [`Device::at`] transactions, optionally draining unsolicited output in
//! between, and finally closed.
//!
//! # Usage Example
//! ```rust,no_run
//! use at_device::{AtDevice, Device, DeviceConfig};
//! use at_transport::{SerialTransport, TransportLayer};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = SerialTransport::new_simple("/dev/ttyUSB0", 9600);
//! transport.open().await?;
//!
//! let mut device = AtDevice::new("mx01", transport);
//! device.init(&DeviceConfig::default()).await?;
//! device.drain().await?;
//! let response = device.at("AT+NAME?\r\n", Duration::from_millis(300)).await?;
//! for line in response.data() {
//!     println!("{}", line);
//! }
//! device.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::DeviceConfig;
use crate::engine::TransactionEngine;
use async_trait::async_trait;
use at_core::{AtResponse, AtResult, TransactionError};
use at_transport::StreamAccessor;
use std::time::Duration;

/// Lifecycle and transaction interface of an AT device
#[async_trait]
pub trait Device: Send {
    /// Device name, for logging
    fn name(&self) -> &str;

    /// Apply configuration
    async fn init(&mut self, config: &DeviceConfig) -> AtResult<()>;

    /// Close the underlying transport
    async fn close(&mut self) -> AtResult<()>;

    /// Discard unsolicited bytes until the line is idle
    ///
    /// # Returns
    /// Number of bytes discarded
    async fn drain(&mut self) -> AtResult<usize>;

    /// Run one AT transaction
    async fn at(&mut self, command: &str, timeout: Duration) -> Result<AtResponse, TransactionError>;
}

/// Generic AT module over any [`StreamAccessor`]
#[derive(Debug)]
pub struct AtDevice<T> {
    name: String,
    engine: TransactionEngine<T>,
}

impl<T> AtDevice<T>
where
    T: StreamAccessor + 'static,
{
    pub fn new(name: impl Into<String>, transport: T) -> Self {
        Self {
            name: name.into(),
            engine: TransactionEngine::new(transport),
        }
    }

    pub fn engine(&self) -> &TransactionEngine<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TransactionEngine<T> {
        &mut self.engine
    }

    pub fn into_transport(self) -> Option<T> {
        self.engine.into_transport()
    }
}

#[async_trait]
impl<T> Device for AtDevice<T>
where
    T: StreamAccessor + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self, config: &DeviceConfig) -> AtResult<()> {
        config.validate()?;
        if let Some(timeout) = config.read_timeout() {
            self.engine.transport_mut()?.set_timeout(Some(timeout)).await?;
        }
        self.engine.set_settings(config.engine_settings());
        log::info!(
            "Initialized AT device {} (buffer {} bytes, read timeout {:?})",
            self.name,
            config.buffer_capacity,
            config.read_timeout()
        );
        Ok(())
    }

    async fn close(&mut self) -> AtResult<()> {
        self.engine.transport_mut()?.close().await?;
        log::info!("Closed AT device {}", self.name);
        Ok(())
    }

    async fn drain(&mut self) -> AtResult<usize> {
        self.engine.drain().await
    }

    async fn at(&mut self, command: &str, timeout: Duration) -> Result<AtResponse, TransactionError> {
        let result = self.engine.execute(command, timeout).await;
        if let Err(e) = &result {
            log::warn!("{}: {}", self.name, e);
        }
        result
    }
}
