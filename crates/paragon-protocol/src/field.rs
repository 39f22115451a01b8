//! Mnemonic fields of device commands.
//!
//! Every command argument is a two-letter mnemonic immediately followed by
//! its value and a TAB: `na` + `Kurtka` + TAB. Numeric values are ASCII
//! decimals; the four text mnemonics (`na`, `al`, `s1`, `ma`) carry bytes in
//! the session's code page.

use bytes::Bytes;
use paragon_core::Result;
use std::fmt;

use crate::{encoding::TextEncoding, validation::validate_field_value};

/// Two-letter field identifiers understood by the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    /// `na` - product name
    Name,
    /// `vt` - VAT rate index
    VatRate,
    /// `pr` - unit price in minor units
    Price,
    /// `il` - quantity
    Quantity,
    /// `wa` - value or payment amount
    Amount,
    /// `ty` - payment type
    PaymentType,
    /// `to` - transaction total
    Total,
    /// `fp` - total paid by payment forms
    PaymentForms,
    /// `re` - change flag
    Change,
    /// `fe` - automatic footer end
    FooterEnd,
    /// `bm` - buffer mode for `trinit`
    BufferMode,
    /// `da` - report date
    Date,
    /// `su` - monthly report summary flag
    Summary,
    /// `fn` - form number
    FormNumber,
    /// `fh` - form header
    FormHeader,
    /// `al` - additional header line
    AdditionalLine,
    /// `s1` - form line text
    Line,
    /// `ma` - formatted line mask
    Mask,
    /// `cm` - form control command
    FormCommand,
}

impl Mnemonic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mnemonic::Name => "na",
            Mnemonic::VatRate => "vt",
            Mnemonic::Price => "pr",
            Mnemonic::Quantity => "il",
            Mnemonic::Amount => "wa",
            Mnemonic::PaymentType => "ty",
            Mnemonic::Total => "to",
            Mnemonic::PaymentForms => "fp",
            Mnemonic::Change => "re",
            Mnemonic::FooterEnd => "fe",
            Mnemonic::BufferMode => "bm",
            Mnemonic::Date => "da",
            Mnemonic::Summary => "su",
            Mnemonic::FormNumber => "fn",
            Mnemonic::FormHeader => "fh",
            Mnemonic::AdditionalLine => "al",
            Mnemonic::Line => "s1",
            Mnemonic::Mask => "ma",
            Mnemonic::FormCommand => "cm",
        }
    }

    /// Whether values of this field are printable text in the session code page.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Mnemonic::Name | Mnemonic::AdditionalLine | Mnemonic::Line | Mnemonic::Mask
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated `(mnemonic, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    mnemonic: Mnemonic,
    value: Bytes,
}

impl Field {
    /// Numeric or flag field, rendered with `Display`.
    ///
    /// Numbers never contain reserved bytes, so no validation is needed.
    pub fn number(mnemonic: Mnemonic, value: impl fmt::Display) -> Self {
        Field {
            mnemonic,
            value: Bytes::from(value.to_string()),
        }
    }

    /// ASCII field taken verbatim (dates, preformatted quantities).
    ///
    /// # Errors
    /// Returns `Error::NonAsciiCharacter` for characters above 0x7F and
    /// `Error::InvalidFieldValue` if `value` contains TAB, STX or ETX.
    pub fn ascii(mnemonic: Mnemonic, value: &str) -> Result<Self> {
        Field::text(mnemonic, value, TextEncoding::Ascii)
    }

    /// Text field encoded with the session code page.
    ///
    /// The encoded bytes are validated, not the source text, since that is
    /// what reaches the wire.
    ///
    /// # Errors
    /// Encoding errors from [`TextEncoding::encode`], or
    /// `Error::InvalidFieldValue` for reserved bytes.
    pub fn text(mnemonic: Mnemonic, value: &str, encoding: TextEncoding) -> Result<Self> {
        let encoded = encoding.encode(value)?;
        validate_field_value(mnemonic.as_str(), &encoded)?;
        Ok(Field {
            mnemonic,
            value: Bytes::from(encoded),
        })
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Serialized length: mnemonic, value and terminator.
    pub fn encoded_len(&self) -> usize {
        2 + self.value.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paragon_core::Error;

    #[test]
    fn test_number_field() {
        let field = Field::number(Mnemonic::Price, 1999);
        assert_eq!(field.mnemonic(), Mnemonic::Price);
        assert_eq!(field.value(), b"1999");
        assert_eq!(field.encoded_len(), 7);
    }

    #[test]
    fn test_text_field_uses_encoding() {
        let field = Field::text(Mnemonic::Name, "Żel", TextEncoding::Mazovia).unwrap();
        assert_eq!(field.value(), &[0xA1, b'e', b'l']);
    }

    #[test]
    fn test_text_field_rejects_tab() {
        let err = Field::text(Mnemonic::Name, "a\tb", TextEncoding::Cp1250).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldValue { ref mnemonic } if mnemonic == "na"));
    }

    #[test]
    fn test_text_field_propagates_encoding_error() {
        let err = Field::text(Mnemonic::Line, "żółć", TextEncoding::Ascii).unwrap_err();
        assert!(matches!(err, Error::NonAsciiCharacter { .. }));
    }

    #[test]
    fn test_ascii_field_rejects_etx() {
        assert!(Field::ascii(Mnemonic::Date, "2025-01-01\x03").is_err());
        assert!(Field::ascii(Mnemonic::Date, "2025-01-01ł").is_err());
        assert!(Field::ascii(Mnemonic::Date, "2025-01-01").is_ok());
    }

    #[test]
    fn test_text_mnemonics() {
        let text: Vec<_> = [
            Mnemonic::Name,
            Mnemonic::VatRate,
            Mnemonic::AdditionalLine,
            Mnemonic::Line,
            Mnemonic::Mask,
            Mnemonic::FormCommand,
        ]
        .into_iter()
        .filter(Mnemonic::is_text)
        .map(|m| m.as_str())
        .collect();
        assert_eq!(text, vec!["na", "al", "s1", "ma"]);
    }
}
