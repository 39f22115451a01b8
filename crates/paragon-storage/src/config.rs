//! Run configuration (`config.json`).
//!
//! ```json
//! {
//!   "printer": { "host": "192.168.69.45", "port": 12345, "timeout": 5,
//!                "log_tx": false, "log_rx": true },
//!   "fiscal":  { "vat_rate": 0, "payment_type": 8,
//!                "shipping_chance": 25, "shipping_price": 1999 },
//!   "encoding": "cp1250"
//! }
//! ```
//!
//! VAT rate and payment type are checked while parsing; everything else is
//! checked by [`Config::validate`], which [`Config::load`] always runs.

use paragon_core::{PaymentType, VatRate};
use paragon_protocol::TextEncoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::json::{read_json, write_json};

/// Printer connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSection {
    /// Printer IP address or host name
    pub host: String,

    /// TCP port
    pub port: u32,

    /// I/O timeout in seconds
    pub timeout: u64,

    /// Log every sent payload
    #[serde(default)]
    pub log_tx: bool,

    /// Log every received payload
    #[serde(default)]
    pub log_rx: bool,
}

/// Fiscal and receipt generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalSection {
    /// Default VAT rate index for receipt lines
    pub vat_rate: VatRate,

    /// Payment form code sent with every receipt
    pub payment_type: PaymentType,

    /// Chance in percent that a receipt gets a shipping line
    pub shipping_chance: i64,

    /// Shipping line price in minor units
    pub shipping_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub printer: PrinterSection,
    pub fiscal: FiscalSection,

    /// Code page name, see [`TextEncoding`]
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    TextEncoding::default().as_str().to_string()
}

impl Config {
    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    /// `Io`, `Json` or `Validation`.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let config: Config = read_json(path)?;
        config.validate()?;
        info!(
            path = %path.display(),
            printer = %config.printer_address(),
            encoding = %config.encoding,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_json(path.as_ref(), self)
    }

    /// Check values the JSON types cannot express.
    ///
    /// # Errors
    /// `Validation` naming the first offending setting.
    pub fn validate(&self) -> StorageResult<()> {
        if self.printer.host.trim().is_empty() {
            return Err(StorageError::Validation("printer host is empty".to_string()));
        }
        if !(1..=65535).contains(&self.printer.port) {
            return Err(StorageError::Validation(format!(
                "invalid printer port: {}",
                self.printer.port
            )));
        }
        if self.printer.timeout == 0 {
            return Err(StorageError::Validation(
                "printer timeout must be positive".to_string(),
            ));
        }
        if !(0..=100).contains(&self.fiscal.shipping_chance) {
            return Err(StorageError::Validation(format!(
                "shipping chance outside 0-100%: {}",
                self.fiscal.shipping_chance
            )));
        }
        if self.fiscal.shipping_price < 0 {
            return Err(StorageError::Validation(format!(
                "negative shipping price: {}",
                self.fiscal.shipping_price
            )));
        }
        self.encoding()?;
        Ok(())
    }

    /// Sample configuration written by `--create-config`.
    pub fn example() -> Self {
        Config {
            printer: PrinterSection {
                host: "192.168.69.45".to_string(),
                port: 12345,
                timeout: 5,
                log_tx: false,
                log_rx: true,
            },
            fiscal: FiscalSection {
                vat_rate: VatRate::default(),
                payment_type: PaymentType::TRANSFER,
                shipping_chance: 25,
                shipping_price: 1999,
            },
            encoding: default_encoding(),
        }
    }

    /// `host:port` of the printer.
    pub fn printer_address(&self) -> String {
        format!("{}:{}", self.printer.host, self.printer.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.printer.timeout)
    }

    /// Parsed code page.
    ///
    /// # Errors
    /// `Validation` for an unknown encoding name.
    pub fn encoding(&self) -> StorageResult<TextEncoding> {
        self.encoding
            .parse()
            .map_err(|e: paragon_core::Error| StorageError::Validation(e.to_string()))
    }

    /// Shipping chance clamped into a percentage.
    pub fn shipping_chance(&self) -> u8 {
        self.fiscal.shipping_chance.clamp(0, 100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_example_is_valid() {
        let config = Config::example();
        config.validate().unwrap();
        assert_eq!(config.printer_address(), "192.168.69.45:12345");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.encoding().unwrap(), TextEncoding::Cp1250);
        assert_eq!(config.shipping_chance(), 25);
    }

    #[rstest]
    #[case("host", "host")]
    #[case("port_zero", "port")]
    #[case("port_high", "port")]
    #[case("timeout", "timeout")]
    #[case("chance_high", "shipping chance")]
    #[case("chance_negative", "shipping chance")]
    #[case("shipping_price", "shipping price")]
    #[case("encoding", "encoding")]
    fn test_validation_failures(#[case] broken: &str, #[case] needle: &str) {
        let mut config = Config::example();
        match broken {
            "host" => config.printer.host = " ".to_string(),
            "port_zero" => config.printer.port = 0,
            "port_high" => config.printer.port = 70_000,
            "timeout" => config.printer.timeout = 0,
            "chance_high" => config.fiscal.shipping_chance = 101,
            "chance_negative" => config.fiscal.shipping_chance = -1,
            "shipping_price" => config.fiscal.shipping_price = -5,
            "encoding" => config.encoding = "utf8".to_string(),
            other => unreachable!("unknown case {other}"),
        }

        let err = config.validate().unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(
            err.to_string().to_lowercase().contains(needle),
            "{err} should mention {needle}"
        );
    }

    #[test]
    fn test_parse_rejects_bad_vat_rate() {
        let json = r#"{
            "printer": { "host": "10.0.0.1", "port": 12345, "timeout": 5 },
            "fiscal": { "vat_rate": 9, "payment_type": 8, "shipping_chance": 0, "shipping_price": 0 }
        }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "printer": { "host": "10.0.0.1", "port": 12345, "timeout": 5 },
            "fiscal": { "vat_rate": 2, "payment_type": 0, "shipping_chance": 0, "shipping_price": 0 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(!config.printer.log_tx);
        assert!(!config.printer.log_rx);
        assert_eq!(config.encoding, "cp1250");
        assert_eq!(config.fiscal.payment_type, PaymentType::CASH);
    }
}
