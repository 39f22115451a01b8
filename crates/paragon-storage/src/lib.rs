//! File storage for paragon runs.
//!
//! - [`Config`]: printer and fiscal settings (`config.json`)
//! - [`Inventory`]: product catalog with stock counters (`data.json`)
//! - [`transactions`]: sales imported from CSV exports
//!
//! All loaders validate what they read and report problems as
//! [`StorageError`].

pub mod config;
pub mod error;
pub mod inventory;
mod json;
pub mod transactions;

pub use config::{Config, FiscalSection, PrinterSection};
pub use error::{StorageError, StorageResult};
pub use inventory::Inventory;
pub use transactions::{Transaction, group_by_date, load_path};
