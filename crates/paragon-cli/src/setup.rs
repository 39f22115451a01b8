//! Translation of the configuration file into component settings.

use anyhow::Result;
use paragon_fiscal::FiscalSettings;
use paragon_network::PrinterClientConfig;
use paragon_selector::SelectorSettings;
use paragon_storage::Config;
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

pub fn client_config(config: &Config) -> PrinterClientConfig {
    PrinterClientConfig {
        address: config.printer_address(),
        timeout: config.timeout(),
        log_tx: config.printer.log_tx,
        log_rx: config.printer.log_rx,
    }
}

pub fn fiscal_settings(config: &Config) -> Result<FiscalSettings> {
    Ok(FiscalSettings {
        vat_rate: config.fiscal.vat_rate,
        payment_type: config.fiscal.payment_type,
        encoding: config.encoding()?,
        ..FiscalSettings::default()
    })
}

pub fn selector_settings(config: &Config) -> SelectorSettings {
    SelectorSettings {
        shipping_chance: config.shipping_chance(),
        shipping_price: config.fiscal.shipping_price,
    }
}

/// Seeded generator when a seed is given, otherwise seeded from the OS.
pub fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!(seed, "Using fixed selection seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}
