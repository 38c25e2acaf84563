//! Scripted in-memory transport
//!
//! `MockTransport` plays back a scripted reply for every command written to
//! it, which makes transactions fully deterministic in tests. Between
//! scripted steps and after the script runs dry it behaves like an idle
//! serial line: each read waits for the per-read timeout and then fails with
//! a timeout-class error.
//!
//! ```rust,no_run
//! use at_transport::mock::{MockTransport, ReadStep};
//!
//! let transport = MockTransport::new()
//!     .reply("AT+NAME?\r\n", [ReadStep::data("+NAME:FOO\r\n")])
//!     .reply("AT+RST\r\n", [ReadStep::data("OK\r\n")]);
//! ```

use crate::error::{AtError, AtResult};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// Per-read timeout of a fresh mock
pub const DEFAULT_MOCK_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// One scripted outcome of a `read` call
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Deliver bytes. A chunk larger than the caller's buffer is split
    /// across consecutive reads.
    Data(Bytes),
    /// Deliver bytes, then report a timeout-class error for the same call
    TimeoutWith(Bytes),
    /// Wait, then report a timeout-class error with nothing delivered
    Stall(Duration),
    /// Fail with a non-recoverable I/O error
    Fail(io::ErrorKind),
    /// Report end of stream: return 0 and mark the transport closed
    Eof,
}

impl ReadStep {
    pub fn data(bytes: impl AsRef<[u8]>) -> Self {
        ReadStep::Data(Bytes::copy_from_slice(bytes.as_ref()))
    }

    pub fn timeout_with(bytes: impl AsRef<[u8]>) -> Self {
        ReadStep::TimeoutWith(Bytes::copy_from_slice(bytes.as_ref()))
    }
}

/// Deterministic scripted transport
#[derive(Debug)]
pub struct MockTransport {
    replies: HashMap<Vec<u8>, Vec<ReadStep>>,
    pending: VecDeque<ReadStep>,
    written: BytesMut,
    write_error: Option<io::ErrorKind>,
    timeout: Option<Duration>,
    reads: usize,
    closed: bool,
}

impl MockTransport {
    /// Create an open mock with no scripted replies
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            pending: VecDeque::new(),
            written: BytesMut::new(),
            write_error: None,
            timeout: Some(DEFAULT_MOCK_READ_TIMEOUT),
            reads: 0,
            closed: false,
        }
    }

    /// Script the reply played back every time `command` is written
    ///
    /// Writing a command replaces whatever reply steps were still pending.
    pub fn reply<I>(mut self, command: impl AsRef<[u8]>, steps: I) -> Self
    where
        I: IntoIterator<Item = ReadStep>,
    {
        self.replies
            .insert(command.as_ref().to_vec(), steps.into_iter().collect());
        self
    }

    /// Queue steps that are not a reply to anything, e.g. unsolicited
    /// result codes sitting on the line
    pub fn push_read(&mut self, step: ReadStep) {
        self.pending.push_back(step);
    }

    /// Make every subsequent write fail with `kind`
    pub fn fail_writes(mut self, kind: io::ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    /// All bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of `read` calls made so far
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Number of scripted steps not consumed yet
    pub fn pending_steps(&self) -> usize {
        self.pending.len()
    }

    async fn idle(&self) -> AtResult<usize> {
        match self.timeout {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                Err(AtError::timeout())
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportLayer for MockTransport {
    async fn open(&mut self) -> AtResult<()> {
        if !self.closed {
            return Err(AtError::Connection(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for MockTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> AtResult<()> {
        self.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> AtResult<usize> {
        if self.closed {
            return Err(AtError::NotConnected);
        }
        self.reads += 1;

        let Some(step) = self.pending.pop_front() else {
            return self.idle().await;
        };

        match step {
            ReadStep::Data(mut bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                bytes.advance(n);
                if !bytes.is_empty() {
                    self.pending.push_front(ReadStep::Data(bytes));
                }
                Ok(n)
            }
            ReadStep::TimeoutWith(mut bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                bytes.advance(n);
                if !bytes.is_empty() {
                    self.pending.push_front(ReadStep::Data(bytes));
                }
                Err(AtError::Timeout { transferred: n })
            }
            ReadStep::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Err(AtError::timeout())
            }
            ReadStep::Fail(kind) => {
                self.closed = true;
                Err(AtError::Connection(io::Error::new(kind, "scripted read failure")))
            }
            ReadStep::Eof => {
                self.closed = true;
                Ok(0)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> AtResult<usize> {
        if self.closed {
            return Err(AtError::NotConnected);
        }
        if let Some(kind) = self.write_error {
            return Err(AtError::Connection(io::Error::new(kind, "scripted write failure")));
        }

        self.written.extend_from_slice(buf);
        if let Some(steps) = self.replies.get(buf) {
            self.pending = steps.iter().cloned().collect();
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> AtResult<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> AtResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_played_after_write() {
        let mut transport =
            MockTransport::new().reply("AT+RST\r\n", [ReadStep::data("OK\r\n")]);
        let mut buf = [0u8; 16];

        assert!(transport.read(&mut buf).await.unwrap_err().is_timeout());

        transport.write_all(b"AT+RST\r\n").await.unwrap();
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"OK\r\n");
        assert_eq!(transport.written(), b"AT+RST\r\n");
    }

    #[tokio::test]
    async fn test_data_split_across_small_buffers() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("+NAME:FOO"));

        let mut buf = [0u8; 4];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"+NAM");
        assert_eq!(transport.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"E:FO");
        assert_eq!(transport.read(&mut buf).await.unwrap(), 1);
        assert_eq!(buf[0], b'O');
        assert_eq!(transport.pending_steps(), 0);
    }

    #[tokio::test]
    async fn test_timeout_with_partial_bytes() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::timeout_with("OK"));

        let mut buf = [0u8; 8];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.transferred(), 2);
        assert_eq!(&buf[..2], b"OK");
    }

    #[tokio::test]
    async fn test_fail_closes() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::Fail(io::ErrorKind::BrokenPipe));

        let mut buf = [0u8; 8];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(!err.is_timeout());
        assert!(transport.is_closed());
        assert!(matches!(
            transport.read(&mut buf).await,
            Err(AtError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_eof_closes() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::Eof);

        let mut buf = [0u8; 8];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 0);
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_write_failure() {
        let mut transport = MockTransport::new().fail_writes(io::ErrorKind::PermissionDenied);
        assert!(transport.write_all(b"AT\r\n").await.is_err());
        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_boxed_dyn_transport() {
        let mut transport: Box<dyn StreamAccessor> =
            Box::new(MockTransport::new().reply("ATI\r\n", [ReadStep::data("MX01\r\n")]));
        transport.write_all(b"ATI\r\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"MX01\r\n");
    }
}
