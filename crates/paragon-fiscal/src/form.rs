//! Non-fiscal printouts on form 200.
//!
//! The "super form" prints free text outside the fiscal memory. A form is
//! opened with `formstart`, filled line by line and closed with `formend`;
//! every command waits for its own response like a transaction step.
//!
//! ```no_run
//! # use paragon_fiscal::{FiscalSession, FiscalSettings};
//! # use paragon_network::{PrinterClient, PrinterClientConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut client = PrinterClient::open(PrinterClientConfig::default()).await?;
//! let mut session = FiscalSession::new(&mut client, FiscalSettings::default());
//!
//! let mut form = session.start_form(None, Some("Zestawienie")).await?;
//! form.formatted_line("Razem: 19.99", None).await?;
//! form.command(1).await?;
//! form.tiny_line("dziękujemy").await?;
//! form.end().await?;
//! # Ok(())
//! # }
//! ```

use paragon_network::FrameTransport;
use paragon_protocol::Command;
use tracing::debug;

use crate::error::FiscalResult;
use crate::session::FiscalSession;

/// Blank line control code for [`NonFiscalForm::command`].
pub const FORM_BLANK_LINE: u32 = 0;

/// Separator line control code for [`NonFiscalForm::command`].
pub const FORM_SEPARATOR: u32 = 1;

/// An open form 200 printout.
///
/// Borrows the session mutably, so no fiscal command can be sent while the
/// form is open. Dropping it without [`NonFiscalForm::end`] leaves the form
/// open on the printer.
pub struct NonFiscalForm<'s, 'a, T: FrameTransport> {
    session: &'s mut FiscalSession<'a, T>,
    lines: usize,
}

impl<'a, T: FrameTransport> FiscalSession<'a, T> {
    /// Send `formstart` and return the open form.
    ///
    /// # Errors
    /// `InvalidState` during a fiscal transaction; `Protocol` when the
    /// additional line cannot be encoded; transport or rejection errors.
    pub async fn start_form<'s>(
        &'s mut self,
        header: Option<u32>,
        additional_line: Option<&str>,
    ) -> FiscalResult<NonFiscalForm<'s, 'a, T>> {
        if !self.state().is_ready() {
            return Err(self.invalid_state("start_form"));
        }
        let command = Command::form_start(header, additional_line, self.encoding())?;
        self.exchange(&command).await?;
        debug!(?header, "Form started");

        Ok(NonFiscalForm {
            session: self,
            lines: 0,
        })
    }
}

impl<T: FrameTransport> NonFiscalForm<'_, '_, T> {
    /// Print `line`, optionally formatted with `mask`.
    pub async fn formatted_line(&mut self, line: &str, mask: Option<&str>) -> FiscalResult<()> {
        let command = Command::form_formatted_line(line, mask, self.session.encoding())?;
        self.send(&command).await
    }

    /// Print `line` in the small font.
    pub async fn tiny_line(&mut self, line: &str) -> FiscalResult<()> {
        let command = Command::form_tiny_line(line, self.session.encoding())?;
        self.send(&command).await
    }

    /// Send a control code, see [`FORM_BLANK_LINE`] and [`FORM_SEPARATOR`].
    pub async fn command(&mut self, code: u32) -> FiscalResult<()> {
        self.send(&Command::form_control(code)).await
    }

    /// Number of lines and control commands accepted so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Send `formend` and release the session.
    pub async fn end(self) -> FiscalResult<()> {
        self.session.exchange(&Command::form_end()).await?;
        debug!(lines = self.lines, "Form ended");
        Ok(())
    }

    async fn send(&mut self, command: &Command) -> FiscalResult<()> {
        self.session.exchange(command).await?;
        self.lines += 1;
        Ok(())
    }
}
