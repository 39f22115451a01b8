//! Fiscal transaction state machine.
//!
//! A legal receipt is printed by a fixed command sequence; the printer
//! refuses commands that arrive out of order, so the session tracks where the
//! transaction is and refuses out-of-order calls before any I/O.
//!
//! # States
//!
//! ```text
//! ┌──────┐ trinit ┌─────────────────┐ trline ┌───────────┐ trpayment ┌─────────────────┐ trend ┌────────┐
//! │ Idle │───────>│ TransactionOpen │───────>│ LineAdded │──────────>│ PaymentRecorded │──────>│ Closed │
//! └──────┘        └─────────────────┘        └───────────┘           └─────────────────┘       └────────┘
//!    ^                                        │  ^  trline                                         │
//!    │                                        └──┘                                                 │
//!    └─────────────────────────────── next receipt (Closed acts as Idle) ──────────────────────────┘
//! ```
//!
//! Reports and non-fiscal forms are only available from `Idle` or `Closed`.
//! A failed step leaves the state where it was; the printer keeps its own
//! half-open transaction and [`FiscalSession::abandon_transaction`] lets the
//! caller move on with the next receipt.
//!
//! # Response Handling
//!
//! Every command waits for exactly one response frame before the next one is
//! sent: 3 s for transaction steps, 10 s for reports. The response is
//! classified by [`classify_response`].
//!
//! # Example
//!
//! ```no_run
//! use paragon_core::{Receipt, ReceiptLine};
//! use paragon_fiscal::{FiscalSession, FiscalSettings};
//! use paragon_network::{PrinterClient, PrinterClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = PrinterClient::open(PrinterClientConfig::default()).await?;
//! let mut session = FiscalSession::new(&mut client, FiscalSettings::default());
//!
//! let mut receipt = Receipt::new(1999);
//! receipt.push(ReceiptLine::new("Bluzka", 1999));
//! session.print_receipt(&receipt).await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use paragon_core::{
    PaymentType, Receipt, ReceiptLine, VatRate, format_amount,
    constants::{REPORT_RESPONSE_TIMEOUT_MS, STEP_RESPONSE_TIMEOUT_MS},
};
use paragon_network::FrameTransport;
use paragon_protocol::{Command, TextEncoding, Verdict, classify_response};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{FiscalError, FiscalResult};

/// Client-side view of the printer's fiscal transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// No transaction; reports and forms allowed.
    Idle,

    /// `trinit` acknowledged, no lines yet.
    TransactionOpen,

    /// At least one `trline` acknowledged.
    LineAdded,

    /// `trpayment` acknowledged.
    PaymentRecorded,

    /// `trend` acknowledged; equivalent to `Idle` for what may follow.
    Closed,
}

impl TransactionState {
    /// Check if a transition to `target` is part of the receipt sequence.
    ///
    /// ```
    /// use paragon_fiscal::TransactionState;
    ///
    /// assert!(TransactionState::Idle.can_transition_to(&TransactionState::TransactionOpen));
    /// assert!(TransactionState::LineAdded.can_transition_to(&TransactionState::LineAdded));
    /// assert!(!TransactionState::TransactionOpen.can_transition_to(&TransactionState::PaymentRecorded));
    /// ```
    pub fn can_transition_to(&self, target: &TransactionState) -> bool {
        matches!(
            (self, target),
            (
                TransactionState::Idle | TransactionState::Closed,
                TransactionState::TransactionOpen
            ) | (
                TransactionState::TransactionOpen | TransactionState::LineAdded,
                TransactionState::LineAdded
            ) | (TransactionState::LineAdded, TransactionState::PaymentRecorded)
                | (TransactionState::PaymentRecorded, TransactionState::Closed)
        )
    }

    /// No transaction in progress: a new one, a report or a form may start.
    pub fn is_ready(&self) -> bool {
        matches!(self, TransactionState::Idle | TransactionState::Closed)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Idle => "Idle",
            TransactionState::TransactionOpen => "TransactionOpen",
            TransactionState::LineAdded => "LineAdded",
            TransactionState::PaymentRecorded => "PaymentRecorded",
            TransactionState::Closed => "Closed",
        };
        f.write_str(s)
    }
}

/// Session-wide defaults and response deadlines.
#[derive(Debug, Clone)]
pub struct FiscalSettings {
    /// VAT rate for lines that do not carry their own.
    pub vat_rate: VatRate,

    /// Payment type sent with `trpayment`.
    pub payment_type: PaymentType,

    /// Code page for text fields.
    pub encoding: TextEncoding,

    /// Response deadline for transaction steps and form commands.
    pub step_timeout: Duration,

    /// Response deadline for reports.
    pub report_timeout: Duration,
}

impl Default for FiscalSettings {
    fn default() -> Self {
        Self {
            vat_rate: VatRate::default(),
            payment_type: PaymentType::TRANSFER,
            encoding: TextEncoding::default(),
            step_timeout: Duration::from_millis(STEP_RESPONSE_TIMEOUT_MS),
            report_timeout: Duration::from_millis(REPORT_RESPONSE_TIMEOUT_MS),
        }
    }
}

/// Drives fiscal commands over a borrowed transport.
///
/// The session holds `&mut` to its transport for its whole life, so no other
/// request can interleave with a transaction.
pub struct FiscalSession<'a, T: FrameTransport> {
    transport: &'a mut T,
    settings: FiscalSettings,
    state: TransactionState,
}

impl<'a, T: FrameTransport> FiscalSession<'a, T> {
    pub fn new(transport: &'a mut T, settings: FiscalSettings) -> Self {
        debug!(
            vat_rate = %settings.vat_rate,
            payment_type = %settings.payment_type,
            encoding = %settings.encoding,
            "Creating fiscal session"
        );
        Self {
            transport,
            settings,
            state: TransactionState::Idle,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn settings(&self) -> &FiscalSettings {
        &self.settings
    }

    // ------------------------------------------------------------------------
    // Transaction steps
    // ------------------------------------------------------------------------

    /// Send `trinit` and open a transaction.
    ///
    /// # Errors
    /// `InvalidState` unless `Idle`/`Closed`; transport or rejection errors.
    pub async fn open_transaction(&mut self) -> FiscalResult<()> {
        self.require(TransactionState::TransactionOpen, "open_transaction")?;
        self.exchange(&Command::transaction_init()).await?;
        self.enter(TransactionState::TransactionOpen);
        Ok(())
    }

    /// Send `trline` for one line.
    ///
    /// # Errors
    /// `InvalidState` unless a transaction is open; `Protocol` if the name
    /// cannot be encoded (nothing is sent); transport or rejection errors.
    pub async fn add_line(&mut self, line: &ReceiptLine) -> FiscalResult<()> {
        self.require(TransactionState::LineAdded, "add_line")?;
        let command =
            Command::transaction_line(line, self.settings.vat_rate, self.settings.encoding)?;
        self.exchange(&command).await?;
        self.enter(TransactionState::LineAdded);
        Ok(())
    }

    /// Send `trpayment` for `total` minor units.
    ///
    /// # Errors
    /// `InvalidState` unless at least one line was added; transport or
    /// rejection errors.
    pub async fn record_payment(&mut self, total: i64) -> FiscalResult<()> {
        self.require(TransactionState::PaymentRecorded, "record_payment")?;
        self.exchange(&Command::transaction_payment(self.settings.payment_type, total))
            .await?;
        self.enter(TransactionState::PaymentRecorded);
        Ok(())
    }

    /// Send `trend` closing a transaction of `total` minor units.
    ///
    /// # Errors
    /// `InvalidState` unless the payment was recorded; transport or
    /// rejection errors.
    pub async fn close_transaction(&mut self, total: i64) -> FiscalResult<()> {
        self.require(TransactionState::Closed, "close_transaction")?;
        self.exchange(&Command::transaction_end(total)).await?;
        self.enter(TransactionState::Closed);
        Ok(())
    }

    /// Print a complete receipt.
    ///
    /// The receipt is validated before anything is sent. The first failing
    /// step aborts the sequence with its error; nothing is rolled back.
    ///
    /// # Errors
    /// `Protocol(InvalidReceipt)` for a malformed receipt, otherwise the
    /// error of the failing step.
    pub async fn print_receipt(&mut self, receipt: &Receipt) -> FiscalResult<()> {
        if !self.state.is_ready() {
            return Err(self.invalid_state("print_receipt"));
        }
        receipt.validate()?;

        info!(
            lines = receipt.lines.len(),
            total = %format_amount(receipt.total),
            "Printing receipt"
        );

        self.open_transaction().await?;
        for line in &receipt.lines {
            self.add_line(line).await?;
        }
        self.record_payment(receipt.total).await?;
        self.close_transaction(receipt.total).await?;

        info!(total = %format_amount(receipt.total), "Receipt printed");
        Ok(())
    }

    /// Forget a half-finished transaction on the client side.
    ///
    /// The printer is not contacted; whatever it holds stays there until it
    /// is cancelled on the device.
    pub fn abandon_transaction(&mut self) {
        if !self.state.is_ready() {
            warn!(state = %self.state, "Abandoning unfinished transaction");
        }
        self.state = TransactionState::Idle;
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// Print the daily report (`dailyrep`), optionally for `date`.
    ///
    /// # Errors
    /// `InvalidState` during a transaction; `Protocol` for a malformed date;
    /// transport or rejection errors.
    pub async fn daily_report(&mut self, date: Option<&str>) -> FiscalResult<()> {
        if !self.state.is_ready() {
            return Err(self.invalid_state("daily_report"));
        }
        info!(date = date.unwrap_or("today"), "Printing daily report");
        self.exchange(&Command::daily_report(date)?).await?;
        Ok(())
    }

    /// Print the monthly report (`monthrep`), optionally dated and in the
    /// summary variant.
    ///
    /// # Errors
    /// Same as [`FiscalSession::daily_report`].
    pub async fn monthly_report(&mut self, date: Option<&str>, summary: bool) -> FiscalResult<()> {
        if !self.state.is_ready() {
            return Err(self.invalid_state("monthly_report"));
        }
        info!(date = date.unwrap_or("current"), summary, "Printing monthly report");
        self.exchange(&Command::monthly_report(date, summary)?).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Send `command`, wait for its response and classify it.
    pub(crate) async fn exchange(&mut self, command: &Command) -> FiscalResult<Bytes> {
        let name = command.name();
        let timeout = if name.is_report() {
            self.settings.report_timeout
        } else {
            self.settings.step_timeout
        };

        debug!(command = %name, fields = command.fields().len(), "Sending command");
        self.transport
            .send(&command.to_payload())
            .await
            .map_err(|source| FiscalError::Transport {
                command: name,
                source,
            })?;

        let response = self
            .transport
            .receive(Some(Instant::now() + timeout))
            .await
            .map_err(|source| {
                if source.is_framing() {
                    warn!(command = %name, error = %source, "Corrupted response frame");
                }
                FiscalError::Transport {
                    command: name,
                    source,
                }
            })?;

        match classify_response(name, &response) {
            Verdict::Accepted => {
                debug!(command = %name, "Command accepted");
                Ok(response)
            }
            Verdict::Rejected(text) => {
                warn!(command = %name, response = %text, "Command rejected");
                Err(FiscalError::Rejected {
                    command: name,
                    response: text,
                })
            }
        }
    }

    pub(crate) fn encoding(&self) -> TextEncoding {
        self.settings.encoding
    }

    pub(crate) fn invalid_state(&self, operation: &'static str) -> FiscalError {
        FiscalError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn require(&self, target: TransactionState, operation: &'static str) -> FiscalResult<()> {
        if self.state.can_transition_to(&target) {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn enter(&mut self, target: TransactionState) {
        debug!(from = %self.state, to = %target, "Transaction state change");
        self.state = target;
    }
}
