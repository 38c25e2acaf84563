//! AT response type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one AT transaction
///
/// Holds the command that was sent and the text lines extracted from the
/// device's reply. An empty `data` means "no usable data", not failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtResponse {
    command: String,
    data: Vec<String>,
}

impl AtResponse {
    /// Create a response for `command` with the given lines
    pub fn new(command: impl Into<String>, data: Vec<String>) -> Self {
        Self {
            command: command.into(),
            data,
        }
    }

    /// Create a response with no data lines
    pub fn empty(command: impl Into<String>) -> Self {
        Self::new(command, Vec::new())
    }

    /// The originating command, exactly as written to the transport
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Extracted lines in the order the device sent them
    pub fn data(&self) -> &[String] {
        &self.data
    }

    /// True when no line was extracted from the reply
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the response, keeping only its lines
    pub fn into_data(self) -> Vec<String> {
        self.data
    }
}

impl fmt::Display for AtResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> [{}]", self.command.trim_end(), self.data.join(", "))
    }
}
