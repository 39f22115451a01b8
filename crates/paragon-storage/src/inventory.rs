//! Stock file (`data.json`).
//!
//! Holds the product catalog with remaining and used unit counters. The file
//! is loaded once per run and written back after the receipts are printed.

use paragon_core::Product;
use paragon_selector::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::json::{read_json, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub products: Vec<Product>,
}

impl Inventory {
    /// Read and validate a stock file.
    ///
    /// # Errors
    /// `Io`, `Json` or `Validation`.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let inventory: Inventory = read_json(path)?;
        inventory.validate()?;
        info!(
            path = %path.display(),
            products = inventory.products.len(),
            stock = inventory.products.iter().map(|p| u64::from(p.stock)).sum::<u64>(),
            "Stock loaded"
        );
        Ok(inventory)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_json(path.as_ref(), self)
    }

    /// # Errors
    /// `Validation` for an empty list, a missing or duplicate name, a
    /// negative price or an inverted price range.
    pub fn validate(&self) -> StorageResult<()> {
        if self.products.is_empty() {
            return Err(StorageError::Validation("stock file has no products".to_string()));
        }

        let mut names = HashSet::new();
        for (i, product) in self.products.iter().enumerate() {
            if product.name.trim().is_empty() {
                return Err(StorageError::Validation(format!("product #{i} has no name")));
            }
            if !names.insert(product.name.as_str()) {
                return Err(StorageError::Validation(format!(
                    "duplicate product name: {}",
                    product.name
                )));
            }
            if product.min_price < 0.0 || product.max_price < 0.0 {
                return Err(StorageError::Validation(format!(
                    "product {}: negative price",
                    product.name
                )));
            }
            if product.min_price > product.max_price {
                return Err(StorageError::Validation(format!(
                    "product {}: min_price {} > max_price {}",
                    product.name, product.min_price, product.max_price
                )));
            }
        }
        Ok(())
    }

    /// Sample stock written by `--create-config`.
    pub fn example() -> Self {
        let products = [
            ("Spodnie", 50.0, 90.0, 100),
            ("Sukienka", 90.0, 150.0, 80),
            ("Kombinezon", 150.0, 250.0, 50),
            ("Kurtka", 250.0, 400.0, 40),
            ("Bluzka", 0.0, 60.0, 150),
            ("Perfumy", 50.0, 150.0, 60),
            ("Majtki", 20.0, 50.0, 200),
            ("Leginsy", 40.0, 60.0, 120),
            ("Sweter", 90.0, 200.0, 70),
            ("Akcesoria kosmetyczne", 0.0, 10.0, 228),
        ];

        Inventory {
            products: products
                .into_iter()
                .map(|(name, min, max, stock)| Product::new(name, min, max, stock))
                .collect(),
        }
    }

    pub fn into_catalog(self) -> Catalog {
        Catalog::new(self.products)
    }
}

impl From<Catalog> for Inventory {
    fn from(catalog: Catalog) -> Self {
        Inventory {
            products: catalog.into_products(),
        }
    }
}

impl From<&Catalog> for Inventory {
    fn from(catalog: &Catalog) -> Self {
        Inventory {
            products: catalog.products().to_vec(),
        }
    }
}
