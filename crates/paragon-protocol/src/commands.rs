//! Device commands and their payload serialization.
//!
//! A command is its name followed by an ordered list of mnemonic fields, each
//! element terminated by TAB:
//!
//! ```text
//! trline<TAB>naKurtka<TAB>vt0<TAB>pr1999<TAB>il1<TAB>wa1999<TAB>
//! ^^^^^^     ^^
//! name       mnemonic + value
//! ```
//!
//! Field order is fixed per command and the printer relies on it, so the
//! constructors below are the only place payload layouts are defined.
//!
//! | Command             | Fields                                  |
//! |---------------------|-----------------------------------------|
//! | `trinit`            | `bm0`                                   |
//! | `trline`            | `na`, `vt`, `pr`, `il`, `wa`            |
//! | `trpayment`         | `ty`, `wa`, `re0`                       |
//! | `trend`             | `to`, `fp`, `re0`, `fe1`                |
//! | `dailyrep`          | `[da]`                                  |
//! | `monthrep`          | `[da]`, `[su1]`                         |
//! | `formstart`         | `fn200`, `[fh]`, `[al]`                 |
//! | `formformattedline` | `s1`, `fn200`, `[ma]`                   |
//! | `formtinyline`      | `fn200`, `s1`                           |
//! | `formcmd`           | `fn200`, `cm`                           |
//! | `formend`           | `fn200`                                 |
//!
//! # Example
//!
//! ```
//! use paragon_protocol::Command;
//! use paragon_core::PaymentType;
//!
//! let cmd = Command::transaction_payment(PaymentType::TRANSFER, 1999);
//! assert_eq!(&cmd.to_payload()[..], b"trpayment\tty8\twa1999\tre0\t");
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use paragon_core::{
    PaymentType, ReceiptLine, Result, VatRate,
    constants::{FIELD_TERMINATOR, SUPER_FORM_NUMBER},
};
use std::fmt;

use crate::{
    encoding::TextEncoding,
    field::{Field, Mnemonic},
};

/// Names of the commands this client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    TransactionInit,
    TransactionLine,
    TransactionPayment,
    TransactionEnd,
    DailyReport,
    MonthlyReport,
    FormStart,
    FormFormattedLine,
    FormTinyLine,
    FormControl,
    FormEnd,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::TransactionInit => "trinit",
            CommandName::TransactionLine => "trline",
            CommandName::TransactionPayment => "trpayment",
            CommandName::TransactionEnd => "trend",
            CommandName::DailyReport => "dailyrep",
            CommandName::MonthlyReport => "monthrep",
            CommandName::FormStart => "formstart",
            CommandName::FormFormattedLine => "formformattedline",
            CommandName::FormTinyLine => "formtinyline",
            CommandName::FormControl => "formcmd",
            CommandName::FormEnd => "formend",
        }
    }

    /// Look up a command by its wire name.
    ///
    /// ```
    /// use paragon_protocol::CommandName;
    ///
    /// assert_eq!(CommandName::parse("trend"), Some(CommandName::TransactionEnd));
    /// assert_eq!(CommandName::parse("TREND"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "trinit" => CommandName::TransactionInit,
            "trline" => CommandName::TransactionLine,
            "trpayment" => CommandName::TransactionPayment,
            "trend" => CommandName::TransactionEnd,
            "dailyrep" => CommandName::DailyReport,
            "monthrep" => CommandName::MonthlyReport,
            "formstart" => CommandName::FormStart,
            "formformattedline" => CommandName::FormFormattedLine,
            "formtinyline" => CommandName::FormTinyLine,
            "formcmd" => CommandName::FormControl,
            "formend" => CommandName::FormEnd,
            _ => return None,
        })
    }

    /// Reports close fiscal totals and take longer to answer.
    pub fn is_report(&self) -> bool {
        matches!(self, CommandName::DailyReport | CommandName::MonthlyReport)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device command ready to be serialized into a frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: CommandName,
    fields: Vec<Field>,
}

impl Command {
    pub fn new(name: CommandName) -> Self {
        Command {
            name,
            fields: Vec::new(),
        }
    }

    /// Append an already built field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a numeric field.
    pub fn number(self, mnemonic: Mnemonic, value: impl fmt::Display) -> Self {
        self.field(Field::number(mnemonic, value))
    }

    /// Append a code page text field.
    ///
    /// # Errors
    /// Encoding or reserved byte errors from [`Field::text`].
    pub fn text(self, mnemonic: Mnemonic, value: &str, encoding: TextEncoding) -> Result<Self> {
        Ok(self.field(Field::text(mnemonic, value, encoding)?))
    }

    /// Append an ASCII field.
    ///
    /// # Errors
    /// Non-ASCII or reserved byte errors from [`Field::ascii`].
    pub fn ascii(self, mnemonic: Mnemonic, value: &str) -> Result<Self> {
        Ok(self.field(Field::ascii(mnemonic, value)?))
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Serialize as `name<TAB>` followed by `mnemonic value<TAB>` per field.
    pub fn to_payload(&self) -> Bytes {
        let name = self.name.as_str();
        let capacity = name.len() + 1 + self.fields.iter().map(Field::encoded_len).sum::<usize>();

        let mut buf = BytesMut::with_capacity(capacity);
        buf.put_slice(name.as_bytes());
        buf.put_u8(FIELD_TERMINATOR);
        for field in &self.fields {
            buf.put_slice(field.mnemonic().as_str().as_bytes());
            buf.put_slice(field.value());
            buf.put_u8(FIELD_TERMINATOR);
        }
        buf.freeze()
    }

    // ------------------------------------------------------------------------
    // Fiscal transaction
    // ------------------------------------------------------------------------

    /// `trinit` in online buffer mode.
    pub fn transaction_init() -> Self {
        Command::new(CommandName::TransactionInit).number(Mnemonic::BufferMode, 0)
    }

    /// `trline` for one receipt line.
    ///
    /// The line's own VAT rate wins over `default_vat`. `wa` carries the
    /// truncated line value.
    ///
    /// # Errors
    /// Encoding or reserved byte errors for the product name.
    pub fn transaction_line(
        line: &ReceiptLine,
        default_vat: VatRate,
        encoding: TextEncoding,
    ) -> Result<Self> {
        let vat = line.vat_rate.unwrap_or(default_vat);
        let quantity = line.quantity_field();

        Ok(Command::new(CommandName::TransactionLine)
            .text(Mnemonic::Name, &line.name, encoding)?
            .number(Mnemonic::VatRate, vat)
            .number(Mnemonic::Price, line.price)
            .ascii(Mnemonic::Quantity, &quantity)?
            .number(Mnemonic::Amount, line.value()))
    }

    /// `trpayment` paying `amount` with `payment`, no change given.
    pub fn transaction_payment(payment: PaymentType, amount: i64) -> Self {
        Command::new(CommandName::TransactionPayment)
            .number(Mnemonic::PaymentType, payment)
            .number(Mnemonic::Amount, amount)
            .number(Mnemonic::Change, 0)
    }

    /// `trend` closing a transaction of `total`, fully paid, footer auto-closed.
    pub fn transaction_end(total: i64) -> Self {
        Command::new(CommandName::TransactionEnd)
            .number(Mnemonic::Total, total)
            .number(Mnemonic::PaymentForms, total)
            .number(Mnemonic::Change, 0)
            .number(Mnemonic::FooterEnd, 1)
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// `dailyrep`, dated when `date` is given.
    ///
    /// # Errors
    /// Returns an error if the date is not plain ASCII or contains reserved bytes.
    pub fn daily_report(date: Option<&str>) -> Result<Self> {
        let cmd = Command::new(CommandName::DailyReport);
        match non_empty(date) {
            Some(date) => cmd.ascii(Mnemonic::Date, date),
            None => Ok(cmd),
        }
    }

    /// `monthrep`, with an optional date and the summary flag.
    ///
    /// # Errors
    /// Returns an error if the date is not plain ASCII or contains reserved bytes.
    pub fn monthly_report(date: Option<&str>, summary: bool) -> Result<Self> {
        let mut cmd = Command::new(CommandName::MonthlyReport);
        if let Some(date) = non_empty(date) {
            cmd = cmd.ascii(Mnemonic::Date, date)?;
        }
        if summary {
            cmd = cmd.number(Mnemonic::Summary, 1);
        }
        Ok(cmd)
    }

    // ------------------------------------------------------------------------
    // Non-fiscal form 200
    // ------------------------------------------------------------------------

    /// `formstart` for form 200 with optional header and additional line.
    ///
    /// # Errors
    /// Encoding or reserved byte errors for the additional line.
    pub fn form_start(
        header: Option<u32>,
        additional_line: Option<&str>,
        encoding: TextEncoding,
    ) -> Result<Self> {
        let mut cmd = Command::new(CommandName::FormStart).number(Mnemonic::FormNumber, SUPER_FORM_NUMBER);
        if let Some(header) = header {
            cmd = cmd.number(Mnemonic::FormHeader, header);
        }
        if let Some(line) = non_empty(additional_line) {
            cmd = cmd.text(Mnemonic::AdditionalLine, line, encoding)?;
        }
        Ok(cmd)
    }

    /// `formformattedline`: the `s1` line comes before the form number.
    ///
    /// # Errors
    /// Encoding or reserved byte errors for the line or mask.
    pub fn form_formatted_line(
        line: &str,
        mask: Option<&str>,
        encoding: TextEncoding,
    ) -> Result<Self> {
        let mut cmd = Command::new(CommandName::FormFormattedLine)
            .text(Mnemonic::Line, line, encoding)?
            .number(Mnemonic::FormNumber, SUPER_FORM_NUMBER);
        if let Some(mask) = non_empty(mask) {
            cmd = cmd.text(Mnemonic::Mask, mask, encoding)?;
        }
        Ok(cmd)
    }

    /// `formtinyline`: small font line.
    ///
    /// # Errors
    /// Encoding or reserved byte errors for the line.
    pub fn form_tiny_line(line: &str, encoding: TextEncoding) -> Result<Self> {
        Command::new(CommandName::FormTinyLine)
            .number(Mnemonic::FormNumber, SUPER_FORM_NUMBER)
            .text(Mnemonic::Line, line, encoding)
    }

    /// `formcmd` with a control code (0 blank line, 1 separator).
    pub fn form_control(code: u32) -> Self {
        Command::new(CommandName::FormControl)
            .number(Mnemonic::FormNumber, SUPER_FORM_NUMBER)
            .number(Mnemonic::FormCommand, code)
    }

    pub fn form_end() -> Self {
        Command::new(CommandName::FormEnd).number(Mnemonic::FormNumber, SUPER_FORM_NUMBER)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
