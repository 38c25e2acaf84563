use crate::response::AtResponse;
use thiserror::Error;

/// Main error type for AT transactions
#[derive(Error, Debug)]
pub enum AtError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The transport's own per-read timeout expired.
    ///
    /// `transferred` counts bytes the transport had already placed into the
    /// caller's buffer before giving up. Most transports report 0 here.
    #[error("Timeout ({transferred} bytes transferred)")]
    Timeout { transferred: usize },

    #[error("Not connected")]
    NotConnected,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Response exceeds buffer capacity of {capacity} bytes")]
    BufferOverflow { capacity: usize },

    #[error("Accumulator task failed: {0}")]
    Task(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AtError {
    /// Timeout error with no partially transferred bytes
    pub fn timeout() -> Self {
        AtError::Timeout { transferred: 0 }
    }

    /// Whether this error is timeout-class, i.e. "no data available yet"
    ///
    /// Timeout-class errors are recoverable: a reader should retry rather
    /// than abort. Everything else is fatal.
    pub fn is_timeout(&self) -> bool {
        match self {
            AtError::Timeout { .. } => true,
            AtError::Connection(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Bytes delivered alongside a timeout-class error
    pub fn transferred(&self) -> usize {
        match self {
            AtError::Timeout { transferred } => *transferred,
            _ => 0,
        }
    }
}

/// Result type alias for AT operations
pub type AtResult<T> = Result<T, AtError>;

/// A failed transaction
///
/// Carries whatever response could be produced before the failure. After a
/// write failure the response has no data; after a fatal read failure it
/// holds the lines classified from the bytes received up to that point.
#[derive(Error, Debug)]
#[error("AT transaction {:?} failed: {source}", .response.command())]
pub struct TransactionError {
    response: AtResponse,
    #[source]
    source: AtError,
}

impl TransactionError {
    pub fn new(response: AtResponse, source: AtError) -> Self {
        Self { response, source }
    }

    /// The partially populated response
    pub fn response(&self) -> &AtResponse {
        &self.response
    }

    /// The underlying error
    pub fn error(&self) -> &AtError {
        &self.source
    }

    pub fn into_parts(self) -> (AtResponse, AtError) {
        (self.response, self.source)
    }
}
