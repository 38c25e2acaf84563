//! Stream accessor trait for transport layer

use crate::error::{AtError, AtResult};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Gives Debug to tokio stream types that lack it
pub(crate) struct OpaqueStream<S> {
    inner: S,
    label: &'static str,
}

impl<S> OpaqueStream<S> {
    pub(crate) fn new(inner: S, label: &'static str) -> Self {
        Self { inner, label }
    }
}

impl<S> fmt::Debug for OpaqueStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.label).finish()
    }
}

impl<S> Deref for OpaqueStream<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S> DerefMut for OpaqueStream<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

/// Stream accessor interface to a byte stream connected to an AT device
///
/// Reads are expected to be bounded by the transport's own per-read
/// timeout. Expiry of that timeout must be reported as a timeout-class
/// error (see [`AtError::is_timeout`]) so readers can tell "nothing yet"
/// apart from a broken link.
#[async_trait]
pub trait StreamAccessor: Send + Sync {
    /// Set the per-read timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means infinite timeout.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> AtResult<()>;

    /// Read data from the stream
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to read into
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> AtResult<usize>;

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> AtResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> AtResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(AtError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered output
    async fn flush(&mut self) -> AtResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> AtResult<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> AtResult<()>;
}

#[async_trait]
impl<T: StreamAccessor + ?Sized> StreamAccessor for Box<T> {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> AtResult<()> {
        (**self).set_timeout(timeout).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> AtResult<usize> {
        (**self).read(buf).await
    }

    async fn write(&mut self, buf: &[u8]) -> AtResult<usize> {
        (**self).write(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> AtResult<()> {
        (**self).write_all(buf).await
    }

    async fn flush(&mut self) -> AtResult<()> {
        (**self).flush().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    async fn close(&mut self) -> AtResult<()> {
        (**self).close().await
    }
}
