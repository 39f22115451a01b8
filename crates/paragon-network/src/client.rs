//! TCP client for the fiscal printer.
//!
//! The printer listens on a plain TCP port. Every request is one frame and
//! every answer is one frame; the client adds the framing on the way out and
//! validates it on the way in.
//!
//! # Example Usage
//!
//! ```no_run
//! use paragon_network::{FrameTransport, PrinterClient, PrinterClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PrinterClientConfig {
//!     address: "192.168.69.45:12345".to_string(),
//!     timeout: Duration::from_secs(5),
//!     log_tx: false,
//!     log_rx: true,
//! };
//!
//! let mut client = PrinterClient::open(config).await?;
//! client.send(b"dailyrep\t").await?;
//! let response = client.receive(None).await?;
//! println!("Received {} bytes", response.len());
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: a failed exchange is reported, the caller decides.
//! - **No reconnect**: one connection per run.
//! - **Deadlines everywhere**: connect and write use the configured timeout,
//!   reads use an explicit deadline or the configured timeout.
//!
//! A framing error (bad checksum, missing marker) fails only the `receive`
//! call that hit it. Bytes after the broken frame stay buffered, so the
//! client remains usable.

use bytes::{Bytes, BytesMut};
use paragon_core::constants::{CLOSE_TIMEOUT_MS, DEFAULT_IO_TIMEOUT_MS, FIELD_TERMINATOR, LINE_FEED};
use paragon_protocol::crc::verify_check_value;
use paragon_protocol::{StreamParser, crc16_ccitt, decode_frame, encode_frame};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::transport::FrameTransport;

/// Read chunk reserved before every socket read.
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for [`PrinterClient`].
///
/// ```
/// use paragon_network::PrinterClientConfig;
///
/// let config = PrinterClientConfig::default();
/// assert_eq!(config.timeout.as_millis(), 5000);
/// ```
#[derive(Debug, Clone)]
pub struct PrinterClientConfig {
    /// `host:port` of the printer; host names are resolved on connect.
    pub address: String,

    /// Timeout for connect, write and default read deadline.
    pub timeout: Duration,

    /// Log every sent payload.
    pub log_tx: bool,

    /// Log every received payload.
    pub log_rx: bool,
}

impl Default for PrinterClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:12345".to_string(),
            timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
            log_tx: false,
            log_rx: false,
        }
    }
}

/// Errors raised by the printer transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Not connected to printer")]
    NotConnected,

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection timeout after {0}ms")]
    ConnectTimeout(u64),

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    #[error("Connection closed by printer")]
    ConnectionClosed,

    /// Framing error in a received frame.
    #[error("Protocol error: {0}")]
    Protocol(#[from] paragon_core::Error),
}

impl TransportError {
    /// Whether the error is a deadline expiry rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_)
                | TransportError::WriteTimeout(_)
                | TransportError::ReadTimeout(_)
        )
    }

    /// Whether a received frame was corrupted (bad marker or checksum).
    pub fn is_framing(&self) -> bool {
        matches!(self, TransportError::Protocol(e) if e.is_framing())
    }
}

/// TCP connection to a fiscal printer.
///
/// Owns the socket and the stream parser holding bytes received but not yet
/// consumed. Not shareable: one session drives it through `&mut`.
pub struct PrinterClient {
    address: String,
    timeout: Duration,
    log_tx: bool,
    log_rx: bool,
    stream: Option<TcpStream>,
    parser: StreamParser,
    read_buf: BytesMut,
}

impl PrinterClient {
    /// Create an unconnected client.
    pub fn new(config: PrinterClientConfig) -> Self {
        debug!("Creating printer client for {}", config.address);

        Self {
            address: config.address,
            timeout: config.timeout,
            log_tx: config.log_tx,
            log_rx: config.log_rx,
            stream: None,
            parser: StreamParser::new(),
            read_buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Create a client and connect it.
    ///
    /// # Errors
    /// See [`PrinterClient::connect`].
    pub async fn open(config: PrinterClientConfig) -> Result<Self, TransportError> {
        let mut client = Self::new(config);
        client.connect().await?;
        Ok(client)
    }

    /// Connect to the printer within the configured timeout.
    ///
    /// The checksum self-test runs first; frames are never exchanged with a
    /// checksum that fails its reference vector.
    ///
    /// TCP_NODELAY is enabled: commands are small and every one waits for
    /// an answer, so Nagle's algorithm would only add latency.
    ///
    /// # Errors
    ///
    /// - `TransportError::Protocol(ChecksumSelfTest)` - self-test failed
    /// - `TransportError::Connect` - refused, unreachable or unresolvable
    /// - `TransportError::ConnectTimeout` - no answer within the timeout
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.connect_verified(crc16_ccitt).await
    }

    async fn connect_verified(&mut self, checksum: fn(&[u8]) -> u16) -> Result<(), TransportError> {
        verify_check_value(checksum).inspect_err(|e| error!("{}", e))?;
        debug!("Checksum self-test passed");

        info!("Connecting to printer at {}", self.address);

        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(self.address.as_str()))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("Connection to {} failed: {}", self.address, e);
                return Err(TransportError::Connect {
                    addr: self.address.clone(),
                    source: e,
                });
            }
            Err(_) => {
                warn!("Connection timeout after {}ms", self.timeout.as_millis());
                return Err(TransportError::ConnectTimeout(self.timeout_ms()));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        self.parser.clear();
        self.stream = Some(stream);
        info!("Connected to {}", self.address);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Flush and shut the connection down, each step bounded by 500 ms.
    ///
    /// Idempotent; failures while closing are logged, not returned.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            info!("Closing connection to {}", self.address);
            let bound = Duration::from_millis(CLOSE_TIMEOUT_MS);

            match tokio::time::timeout(bound, stream.flush()).await {
                Ok(Ok(())) => debug!("Flush completed"),
                Ok(Err(e)) => warn!("Error flushing during close: {}", e),
                Err(_) => warn!("Flush timeout during close ({}ms)", bound.as_millis()),
            }

            match tokio::time::timeout(bound, stream.shutdown()).await {
                Ok(Ok(())) => debug!("Shutdown completed"),
                Ok(Err(e)) => warn!("Error during shutdown: {}", e),
                Err(_) => warn!("Shutdown timeout during close ({}ms)", bound.as_millis()),
            }

            self.parser.clear();
        }

        Ok(())
    }

    async fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let frame = encode_frame(payload);
        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        match tokio::time::timeout(timeout, stream.write_all(&frame)).await {
            Ok(Ok(())) => {
                trace!(bytes = frame.len(), "Frame written");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Failed to write frame: {}", e);
                Err(TransportError::Write(e))
            }
            Err(_) => {
                warn!("Write timeout after {}ms", timeout.as_millis());
                Err(TransportError::WriteTimeout(timeout_ms))
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl FrameTransport for PrinterClient {
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.log_tx {
            info!(payload = %hex::encode(payload), "TX");
        }
        self.write_frame(payload).await
    }

    async fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        if self.log_tx {
            info!(payload = %escape_payload(payload.as_bytes()), "TX");
        }
        self.write_frame(payload.as_bytes()).await
    }

    async fn receive(&mut self, deadline: Option<Instant>) -> Result<Bytes, TransportError> {
        let started = Instant::now();
        let deadline = deadline.unwrap_or(started + self.timeout);

        loop {
            if let Some(raw) = self.parser.next_frame() {
                let payload = decode_frame(&raw).map_err(|e| {
                    warn!("Discarding invalid frame: {}", e);
                    TransportError::Protocol(e)
                })?;
                if self.log_rx {
                    info!(payload = %escape_payload(&payload), "RX");
                }
                return Ok(payload);
            }

            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
            self.read_buf.clear();
            self.read_buf.reserve(READ_CHUNK_SIZE);

            match tokio::time::timeout_at(deadline, stream.read_buf(&mut self.read_buf)).await {
                Ok(Ok(0)) => {
                    warn!("Connection closed by printer");
                    return Err(TransportError::ConnectionClosed);
                }
                Ok(Ok(n)) => {
                    trace!(bytes = n, "Received data");
                    self.parser.feed(&self.read_buf[..n]);
                }
                Ok(Err(e)) => {
                    error!("Read failed: {}", e);
                    return Err(TransportError::Read(e));
                }
                Err(_) => {
                    let waited = deadline.saturating_duration_since(started);
                    warn!("Read timeout after {}ms", waited.as_millis());
                    return Err(TransportError::ReadTimeout(waited.as_millis() as u64));
                }
            }
        }
    }
}

impl Drop for PrinterClient {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("PrinterClient dropped while connected, connection will be closed");
        }
    }
}

/// Render a payload for logs with TAB and LF escaped.
///
/// Other bytes are decoded lossily, so code page letters may show up as
/// replacement characters.
///
/// ```
/// use paragon_network::escape_payload;
///
/// assert_eq!(escape_payload(b"trinit\tbm0\t\n"), "trinit\\tbm0\\t\\n");
/// ```
pub fn escape_payload(payload: &[u8]) -> String {
    let tab = char::from(FIELD_TERMINATOR);
    let line_feed = char::from(LINE_FEED);

    let mut out = String::with_capacity(payload.len() + 8);
    for chunk in payload.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                c if c == tab => out.push_str("\\t"),
                c if c == line_feed => out.push_str("\\n"),
                _ => out.push(c),
            }
        }
        if !chunk.invalid().is_empty() {
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
    out
}
