//! Frame transport abstraction.
//!
//! The fiscal session only needs to send a payload and wait for the next
//! response payload. [`FrameTransport`] captures that contract so the session
//! runs unchanged over [`PrinterClient`](crate::PrinterClient) or over a
//! scripted transport in tests.
//!
//! The trait uses native `async fn` methods (Edition 2024), so it is not
//! object safe; take it as a generic parameter:
//!
//! ```
//! use paragon_network::{FrameTransport, TransportError};
//!
//! async fn ping<T: FrameTransport>(transport: &mut T) -> Result<bytes::Bytes, TransportError> {
//!     transport.send(b"trinit\tbm0\t").await?;
//!     transport.receive(None).await
//! }
//! ```

#![allow(async_fn_in_trait)]

use bytes::Bytes;
use tokio::time::Instant;

use crate::client::TransportError;

/// Request/response channel carrying framed payloads.
pub trait FrameTransport {
    /// Frame `payload` and write it.
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Same as [`send`](FrameTransport::send) for a payload known to be
    /// ASCII; implementations may log it as text instead of hex.
    async fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        self.send(payload.as_bytes()).await
    }

    /// Wait for the next frame and return its validated payload.
    ///
    /// `deadline` bounds the whole wait; `None` means "now plus the
    /// transport's configured timeout".
    async fn receive(&mut self, deadline: Option<Instant>) -> Result<Bytes, TransportError>;
}
