//! Error types shared with the core crate

pub use at_core::error::{AtError, AtResult};
