//! Transport layer for AT command devices
//!
//! This crate provides the byte-stream capability consumed by the
//! transaction engine, with Serial and TCP implementations and a scripted
//! in-memory transport for tests.

pub mod error;
pub mod mock;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use error::{AtError, AtResult};
pub use mock::{MockTransport, ReadStep};
pub use serial::{SerialSettings, SerialTransport, DEFAULT_READ_TIMEOUT};
pub use stream::{StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport};
