//! Network transport for the fiscal printer.
//!
//! # Components
//!
//! - **PrinterClient**: framed request/response over a single TCP connection
//! - **FrameTransport**: the send/receive contract the fiscal session uses

mod client;
pub mod transport;

pub use client::{PrinterClient, PrinterClientConfig, TransportError, escape_payload};
pub use transport::FrameTransport;
