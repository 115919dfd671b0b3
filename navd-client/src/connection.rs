//! Connection management.

use crate::error::ClientError;
use navd_protocol::{Decoder, Encoder, ProtocolError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Daemon address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for reading one complete result.
    pub request_timeout: Duration,
    /// Read buffer size for socket reads.
    pub read_buffer_size: usize,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }
}

/// A single-use connection to the routing daemon.
///
/// The daemon serves exactly one command per connection: the client writes a
/// command envelope and a command body, reads one result, and the connection
/// is done. Connections are never shared, reused, or pooled.
pub struct Connection {
    stream: Option<TcpStream>,
    decoder: Decoder,
    config: ConnectionConfig,
}

impl Connection {
    /// Opens a TCP connection to the daemon.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!("connecting to {}", config.addr);

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(config.addr))
            .await
            .map_err(|_| {
                tracing::debug!("connection timeout");
                ClientError::Timeout
            })?
            .map_err(|e| {
                tracing::debug!("connection failed: {}", e);
                ClientError::Connect {
                    addr: config.addr,
                    source: e,
                }
            })?;

        stream.set_nodelay(true).ok();

        Ok(Self {
            stream: Some(stream),
            decoder: Decoder::new(),
            config,
        })
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, ClientError> {
        self.stream.as_mut().ok_or(ClientError::ConnectionClosed)
    }

    /// Writes one framed message.
    ///
    /// The prefix and payload are fully transmitted before this returns, so
    /// frames from one connection are never interleaved.
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), ClientError> {
        let encoded = Encoder::encode_message(message)?;
        tracing::debug!("sending frame ({} bytes)", encoded.len());

        let stream = self.stream_mut()?;
        stream.write_all(&encoded).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Reads one framed message, waiting until the full frame has arrived.
    ///
    /// A stream that ends mid-frame surfaces as
    /// [`ProtocolError::IncompleteMessage`]; a truncated payload is never
    /// handed to the decoder.
    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<T, ClientError> {
        let timeout = self.config.request_timeout;
        let buffer_size = self.config.read_buffer_size;

        tokio::time::timeout(timeout, async {
            let mut buf = vec![0u8; buffer_size];

            loop {
                if let Some(message) = self.decoder.decode_message()? {
                    return Ok(message);
                }

                let n = self.stream_mut()?.read(&mut buf).await?;
                tracing::debug!("read {} bytes from socket", n);

                if n == 0 {
                    // EOF: a partial frame means the daemon hung up mid-message.
                    return match self.decoder.needed() {
                        Some(needed) => {
                            Err(ProtocolError::IncompleteMessage { needed }.into())
                        }
                        None => Err(ClientError::ConnectionClosed),
                    };
                }

                self.decoder.extend(&buf[..n]);
            }
        })
        .await
        .map_err(|_| {
            tracing::debug!("read timeout");
            ClientError::Timeout
        })?
    }

    /// Closes the connection.
    ///
    /// Idempotent; safe to call after a failed read or write.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!("closing connection to {}", self.config.addr);
            let _ = stream.shutdown().await;
        }
    }

    /// Returns whether the connection is still open.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
