//! Core types for AT command transactions
//!
//! This crate provides the error types, the response type, and the
//! reply classification logic shared by the transport and device crates.

pub mod classify;
pub mod command;
pub mod error;
pub mod response;

pub use classify::{classify, Classification, ResponseKind, STATUS_ERROR, STATUS_OK};
pub use command::{EchoRule, AT_PREFIX, TERMINATOR};
pub use error::{AtError, AtResult, TransactionError};
pub use response::AtResponse;
