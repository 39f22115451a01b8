use crate::{
    Result,
    constants::{MAX_LINE_NAME_CHARS, MAX_VAT_RATE, MINOR_UNITS_PER_MAJOR, VALID_PAYMENT_TYPES},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// VAT rate index as understood by the printer (`vt0`..`vt6`).
///
/// The index selects one of the rates programmed into the fiscal memory,
/// it is not a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct VatRate(u8);

impl VatRate {
    /// Create a VAT rate index with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidVatRate` if the index is outside 0-6.
    pub fn new(index: i64) -> Result<Self> {
        if !(0..=i64::from(MAX_VAT_RATE)).contains(&index) {
            return Err(Error::InvalidVatRate(index));
        }
        Ok(VatRate(index as u8))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Default for VatRate {
    /// Index 0, the first programmed rate.
    fn default() -> Self {
        VatRate(0)
    }
}

impl TryFrom<i64> for VatRate {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        VatRate::new(value)
    }
}

impl From<VatRate> for i64 {
    fn from(rate: VatRate) -> Self {
        i64::from(rate.0)
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment form code sent in the `ty` field of `trpayment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PaymentType(u8);

impl PaymentType {
    pub const CASH: PaymentType = PaymentType(0);
    pub const CARD: PaymentType = PaymentType(2);
    pub const TRANSFER: PaymentType = PaymentType(8);

    /// Create a payment type with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPaymentType` for codes the printer does not accept.
    pub fn new(code: i64) -> Result<Self> {
        match u8::try_from(code) {
            Ok(c) if VALID_PAYMENT_TYPES.contains(&c) => Ok(PaymentType(c)),
            _ => Err(Error::InvalidPaymentType(code)),
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for PaymentType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        PaymentType::new(value)
    }
}

impl From<PaymentType> for i64 {
    fn from(payment: PaymentType) -> Self {
        i64::from(payment.0)
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format an amount in minor units as a major-unit decimal (`1999` -> `19.99`).
#[must_use]
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let per_major = MINOR_UNITS_PER_MAJOR as u64;
    format!("{sign}{}.{:02}", abs / per_major, abs % per_major)
}

/// Convert a major-unit price (`19.99`) to minor units, rounding to the nearest unit.
#[must_use]
pub fn to_minor_units(major: f64) -> i64 {
    (major * MINOR_UNITS_PER_MAJOR as f64).round() as i64
}

/// Catalog product with a price range and stock counters.
///
/// Prices are major-unit decimals as they appear in the stock file; the
/// selection algorithm works on [`Product::min_price_minor`] and
/// [`Product::max_price_minor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub min_price: f64,
    pub max_price: f64,
    pub stock: u32,
    #[serde(default)]
    pub used: u32,
}

impl Product {
    pub fn new(name: impl Into<String>, min_price: f64, max_price: f64, stock: u32) -> Self {
        Product {
            name: name.into(),
            min_price,
            max_price,
            stock,
            used: 0,
        }
    }

    #[must_use]
    pub fn min_price_minor(&self) -> i64 {
        to_minor_units(self.min_price)
    }

    #[must_use]
    pub fn max_price_minor(&self) -> i64 {
        to_minor_units(self.max_price)
    }

    /// Whether `amount` (minor units) falls inside the product's price range.
    #[must_use]
    pub fn accepts_price(&self, amount: i64) -> bool {
        (self.min_price_minor()..=self.max_price_minor()).contains(&amount)
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product picked for a receipt, with a single resolved price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedProduct {
    pub name: String,
    /// Price in minor units.
    pub price: i64,
    /// Synthetic shipping line; consumes no stock.
    #[serde(default)]
    pub shipping: bool,
}

impl SelectedProduct {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        SelectedProduct {
            name: name.into(),
            price,
            shipping: false,
        }
    }

    pub fn shipping(name: impl Into<String>, price: i64) -> Self {
        SelectedProduct {
            name: name.into(),
            price,
            shipping: true,
        }
    }
}

/// One line of a fiscal receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    /// Unit price in minor units.
    pub price: i64,
    /// Quantity; non-positive values are printed as 1.
    pub quantity: f64,
    /// Line VAT rate; `None` falls back to the session default.
    pub vat_rate: Option<VatRate>,
}

impl ReceiptLine {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        ReceiptLine {
            name: name.into(),
            price,
            quantity: 1.0,
            vat_rate: None,
        }
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_vat_rate(mut self, vat_rate: VatRate) -> Self {
        self.vat_rate = Some(vat_rate);
        self
    }

    #[must_use]
    pub fn effective_quantity(&self) -> f64 {
        if self.quantity > 0.0 { self.quantity } else { 1.0 }
    }

    /// Line value in minor units: price times quantity, truncated toward zero.
    #[must_use]
    pub fn value(&self) -> i64 {
        (self.price as f64 * self.effective_quantity()).trunc() as i64
    }

    /// Quantity as sent in the `il` field: at most 3 decimals, no trailing zeros.
    ///
    /// ```
    /// use paragon_core::ReceiptLine;
    ///
    /// assert_eq!(ReceiptLine::new("x", 100).quantity_field(), "1");
    /// assert_eq!(ReceiptLine::new("x", 100).with_quantity(2.5).quantity_field(), "2.5");
    /// assert_eq!(ReceiptLine::new("x", 100).with_quantity(0.1234).quantity_field(), "0.123");
    /// ```
    #[must_use]
    pub fn quantity_field(&self) -> String {
        let formatted = format!("{:.3}", self.effective_quantity());
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// A complete fiscal receipt.
///
/// `total` must equal the sum of [`ReceiptLine::value`] over all lines; the
/// printer rejects a closing total that does not match its own sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub lines: Vec<ReceiptLine>,
    /// Total in minor units.
    pub total: i64,
}

impl Receipt {
    pub fn new(total: i64) -> Self {
        Receipt {
            lines: Vec::new(),
            total,
        }
    }

    /// Build a receipt from selected products, one unit each, totalled from the prices.
    pub fn from_selection(selection: &[SelectedProduct], vat_rate: Option<VatRate>) -> Self {
        let lines: Vec<ReceiptLine> = selection
            .iter()
            .map(|p| ReceiptLine {
                name: p.name.clone(),
                price: p.price,
                quantity: 1.0,
                vat_rate,
            })
            .collect();
        let total = lines.iter().map(ReceiptLine::value).sum();
        Receipt { lines, total }
    }

    pub fn push(&mut self, line: ReceiptLine) {
        self.lines.push(line);
    }

    /// Sum of truncated line values in minor units.
    #[must_use]
    pub fn lines_total(&self) -> i64 {
        self.lines.iter().map(ReceiptLine::value).sum()
    }

    /// Check the receipt before anything is sent to the printer.
    ///
    /// # Errors
    /// Returns `Error::InvalidReceipt` if the receipt has no lines, a line
    /// name is empty or longer than 80 characters, or the total does not
    /// match the line values.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(Error::InvalidReceipt("receipt has no lines".to_string()));
        }

        for (i, line) in self.lines.iter().enumerate() {
            let chars = line.name.chars().count();
            if chars == 0 {
                return Err(Error::InvalidReceipt(format!("line {i} has an empty name")));
            }
            if chars > MAX_LINE_NAME_CHARS {
                return Err(Error::InvalidReceipt(format!(
                    "line {i} name exceeds {MAX_LINE_NAME_CHARS} characters (got {chars})"
                )));
            }
            if line.price < 0 {
                return Err(Error::InvalidReceipt(format!(
                    "line {i} has a negative price {}",
                    line.price
                )));
            }
        }

        let sum = self.lines_total();
        if sum != self.total {
            return Err(Error::InvalidReceipt(format!(
                "total {} does not match line values {}",
                format_amount(self.total),
                format_amount(sum)
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(6)]
    fn test_vat_rate_valid(#[case] index: i64) {
        assert_eq!(i64::from(VatRate::new(index).unwrap()), index);
    }

    #[rstest]
    #[case(-1)]
    #[case(7)]
    #[case(255)]
    fn test_vat_rate_invalid(#[case] index: i64) {
        assert!(matches!(
            VatRate::new(index),
            Err(Error::InvalidVatRate(i)) if i == index
        ));
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    #[case(2, true)]
    #[case(8, true)]
    #[case(9, false)]
    #[case(-2, false)]
    fn test_payment_type(#[case] code: i64, #[case] valid: bool) {
        assert_eq!(PaymentType::new(code).is_ok(), valid);
    }

    #[test]
    fn test_vat_rate_serde_rejects_out_of_range() {
        let ok: VatRate = serde_json::from_str("4").unwrap();
        assert_eq!(ok.as_u8(), 4);
        assert!(serde_json::from_str::<VatRate>("9").is_err());
    }

    #[rstest]
    #[case(1999, "19.99")]
    #[case(5, "0.05")]
    #[case(0, "0.00")]
    #[case(-150, "-1.50")]
    fn test_format_amount(#[case] minor: i64, #[case] expected: &str) {
        assert_eq!(format_amount(minor), expected);
    }

    #[test]
    fn test_to_minor_units_rounds() {
        // 19.99 * 100 is 1998.9999999999998 in binary floating point
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.0), 0);
        assert_eq!(to_minor_units(250.0), 25000);
    }

    #[test]
    fn test_product_price_range() {
        let product = Product::new("Spodnie", 50.0, 90.0, 10);
        assert_eq!(product.min_price_minor(), 5000);
        assert_eq!(product.max_price_minor(), 9000);
        assert!(product.accepts_price(5000));
        assert!(product.accepts_price(9000));
        assert!(!product.accepts_price(4999));
        assert!(!product.accepts_price(9001));
    }

    #[test]
    fn test_product_used_defaults_to_zero() {
        let json = r#"{"name":"Majtki","min_price":20,"max_price":50,"stock":200}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.used, 0);
        assert_eq!(product.stock, 200);
    }

    #[rstest]
    #[case(1999, 1.0, 1999)]
    #[case(1999, 2.0, 3998)]
    #[case(333, 1.5, 499)] // 499.5 truncated
    #[case(100, 0.0, 100)] // non-positive quantity counts as 1
    #[case(100, -3.0, 100)]
    fn test_line_value_truncates(#[case] price: i64, #[case] qty: f64, #[case] expected: i64) {
        let line = ReceiptLine::new("x", price).with_quantity(qty);
        assert_eq!(line.value(), expected);
    }

    #[rstest]
    #[case(1.0, "1")]
    #[case(10.0, "10")]
    #[case(0.5, "0.5")]
    #[case(1.25, "1.25")]
    #[case(2.0004, "2")]
    #[case(0.0, "1")]
    fn test_quantity_field(#[case] qty: f64, #[case] expected: &str) {
        let line = ReceiptLine::new("x", 1).with_quantity(qty);
        assert_eq!(line.quantity_field(), expected);
    }

    #[test]
    fn test_receipt_from_selection_totals() {
        let selection = vec![
            SelectedProduct::shipping(crate::constants::SHIPPING_LINE_NAME, 1999),
            SelectedProduct::new("Kurtka", 30000),
        ];
        let receipt = Receipt::from_selection(&selection, None);
        assert_eq!(receipt.total, 31999);
        assert_eq!(receipt.lines.len(), 2);
        assert!(receipt.validate().is_ok());
    }

    #[test]
    fn test_receipt_validate_total_mismatch() {
        let mut receipt = Receipt::new(1000);
        receipt.push(ReceiptLine::new("Bluzka", 999));
        let err = receipt.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidReceipt(ref m) if m.contains("does not match")));
    }

    #[test]
    fn test_receipt_validate_truncated_quantity() {
        let mut receipt = Receipt::new(499);
        receipt.push(ReceiptLine::new("Perfumy", 333).with_quantity(1.5));
        assert!(receipt.validate().is_ok());
    }

    #[test]
    fn test_receipt_validate_empty() {
        assert!(Receipt::new(0).validate().is_err());
    }

    #[test]
    fn test_receipt_validate_name_length() {
        let long_name: String = "ż".repeat(81);
        let mut receipt = Receipt::new(100);
        receipt.push(ReceiptLine::new(long_name, 100));
        assert!(receipt.validate().is_err());

        // 80 multi-byte characters are still fine
        let mut receipt = Receipt::new(100);
        receipt.push(ReceiptLine::new("ż".repeat(80), 100));
        assert!(receipt.validate().is_ok());
    }
}
