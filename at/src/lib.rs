//! AT command transactions over serial and serial-like byte streams
//!
//! This library sends AT commands to modem-like modules and collects their
//! replies within a bounded time window, classifying each reply as either
//! echoed data lines or a final `OK`/`ERROR` status.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `at-core`: Errors, response type, reply classification
//! - `at-transport`: Transport layer (Serial, TCP, scripted mock)
//! - `at-device`: Transaction engine and device lifecycle
//!
//! # Usage
//!
//! ```no_run
//! use at::{AtDevice, Device, SerialTransport, TransportLayer};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = SerialTransport::new_simple("/dev/ttyUSB0", 9600);
//! transport.open().await?;
//! let mut device = AtDevice::new("modem", transport);
//! let response = device.at("AT+NAME?\r\n", Duration::from_millis(300)).await?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use at_core::{
    classify, AtError, AtResponse, AtResult, Classification, EchoRule, ResponseKind,
    TransactionError,
};

// Re-export transports
pub use at_transport::{
    MockTransport, ReadStep, SerialSettings, SerialTransport, StreamAccessor, TcpSettings,
    TcpTransport, TransportLayer,
};

// Re-export the engine and device API
pub use at_device::{AtDevice, Device, DeviceConfig, EngineSettings, TransactionEngine};
