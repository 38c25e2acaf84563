//! TCP transport implementation
//!
//! For AT devices reached through a network serial bridge or a virtual COM
//! port server that exposes the raw byte stream over TCP.

use crate::error::{AtError, AtResult};
use crate::stream::{OpaqueStream, StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    /// Connect timeout and per-read/per-write timeout
    pub timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: Some(crate::serial::DEFAULT_READ_TIMEOUT),
        }
    }

    /// Create TCP settings with timeout
    pub fn with_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            timeout: Some(timeout),
        }
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<OpaqueStream<TcpStream>>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    /// Create TCP transport from address string
    pub fn from_address(address: &str) -> AtResult<Self> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| AtError::InvalidData(format!("Invalid TCP address: {}", e)))?;
        Ok(Self::new(TcpSettings::new(addr)))
    }

    /// Create TCP transport from an already-connected TcpStream
    ///
    /// # Arguments
    /// * `stream` - The already-connected TCP stream
    /// * `timeout` - Optional read/write timeout
    pub fn from_connected_stream(stream: TcpStream, timeout: Option<Duration>) -> AtResult<Self> {
        let address = stream.peer_addr().map_err(AtError::Connection)?;
        Ok(Self {
            stream: Some(OpaqueStream::new(stream, "TcpStream")),
            settings: TcpSettings { address, timeout },
            closed: false,
        })
    }

    fn stream_mut(&mut self) -> AtResult<&mut OpaqueStream<TcpStream>> {
        self.stream.as_mut().ok_or_else(|| {
            AtError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream not connected",
            ))
        })
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> AtResult<()> {
        if !self.closed {
            return Err(AtError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let stream = if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, TcpStream::connect(self.settings.address))
                .await
                .map_err(|_| AtError::timeout())?
                .map_err(AtError::Connection)?
        } else {
            TcpStream::connect(self.settings.address)
                .await
                .map_err(AtError::Connection)?
        };
        stream.set_nodelay(true).map_err(AtError::Connection)?;

        log::info!("Connected to {}", self.settings.address);
        self.stream = Some(OpaqueStream::new(stream, "TcpStream"));
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> AtResult<()> {
        self.settings.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> AtResult<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;

        let result = if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| AtError::timeout())?
                .map_err(AtError::Connection)
        } else {
            stream.read(buf).await.map_err(AtError::Connection)
        };

        match result {
            Ok(0) if !buf.is_empty() => {
                self.closed = true;
                Err(AtError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("{} closed the connection", self.settings.address),
                )))
            }
            Ok(n) => Ok(n),
            Err(e) if e.is_timeout() => Err(e),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> AtResult<usize> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;

        if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.write(buf))
                .await
                .map_err(|_| AtError::timeout())?
                .map_err(AtError::Connection)
        } else {
            stream.write(buf).await.map_err(AtError::Connection)
        }
    }

    async fn flush(&mut self) -> AtResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(AtError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> AtResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_settings() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let settings = TcpSettings::new(addr);
        assert_eq!(settings.address, addr);
        assert!(settings.timeout.is_some());
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            TcpTransport::from_address("not an address"),
            Err(AtError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_read_times_out_then_receives() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport =
            TcpTransport::new(TcpSettings::with_timeout(addr, Duration::from_millis(50)));
        transport.open().await.unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();

        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(!transport.is_closed());

        peer.write_all(b"OK\r\n").await.unwrap();
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"OK\r\n");

        transport.write_all(b"AT\r\n").await.unwrap();
        let mut echo = [0u8; 4];
        peer.read_exact(&mut echo).await.unwrap();
        assert_eq!(&echo, b"AT\r\n");
    }

    #[tokio::test]
    async fn test_peer_close_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport = TcpTransport::new(TcpSettings::with_timeout(addr, Duration::from_secs(1)));
        transport.open().await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).await.unwrap_err();
        assert!(!err.is_timeout());
        assert!(
            matches!(&err, AtError::Connection(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
        );
        assert!(transport.is_closed());
    }
}
