//! AT command transaction engine
//!
//! This crate runs command/response exchanges with AT-style modules over
//! any [`at_transport::StreamAccessor`]:
//!
//! - `accumulator`: deadline-bounded collection of fragmented reply bytes
//! - `engine`: one write, one read window, one classification per call
//! - `device`: named devices with init/close/drain lifecycle
//! - `config`: device configuration

pub mod accumulator;
pub mod buffer;
pub mod config;
pub mod deadline;
pub mod device;
pub mod engine;

pub use accumulator::{accumulate, Accumulated};
pub use buffer::{AccumulationBuffer, DEFAULT_BUFFER_CAPACITY};
pub use config::DeviceConfig;
pub use deadline::Deadline;
pub use device::{AtDevice, Device};
pub use engine::{EngineSettings, TransactionEngine};
