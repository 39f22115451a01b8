//! Fiscal printer operations.
//!
//! This crate drives the printer's command sequences over any
//! [`FrameTransport`](paragon_network::FrameTransport):
//!
//! - **FiscalSession**: receipt transaction state machine and reports
//! - **NonFiscalForm**: free-text printouts on form 200

pub mod error;
pub mod form;
pub mod session;

pub use error::{FiscalError, FiscalResult};
pub use form::{FORM_BLANK_LINE, FORM_SEPARATOR, NonFiscalForm};
pub use session::{FiscalSession, FiscalSettings, TransactionState};
