//! Product catalog with temporary stock reservations.

use paragon_core::{Error, Product, Result, SelectedProduct};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Products available for selection, in stock file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Indices of products with stock left.
    pub fn available(&self) -> Vec<usize> {
        self.products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_stock())
            .map(|(i, _)| i)
            .collect()
    }

    /// Units left across all products.
    pub fn total_stock(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.stock)).sum()
    }

    /// Take one unit of the product at `index` until the guard drops.
    ///
    /// Returns `None` when the index is unknown or the product has no stock.
    /// The guard dereferences to the catalog, so a search can keep going
    /// through it.
    pub fn reserve(&mut self, index: usize) -> Option<Reservation<'_>> {
        let product = self.products.get_mut(index)?;
        product.stock = product.stock.checked_sub(1)?;
        Some(Reservation {
            catalog: self,
            index,
        })
    }

    /// Permanently take stock for a printed selection.
    ///
    /// Shipping lines are skipped. Every product is checked before anything
    /// changes, so a failed commit leaves the catalog untouched.
    ///
    /// # Errors
    /// `ProductNotFound` for an unknown name, `OutOfStock` when the selection
    /// needs more units than are left.
    pub fn commit(&mut self, selection: &[SelectedProduct]) -> Result<()> {
        let mut needed: HashMap<usize, u32> = HashMap::new();

        for item in selection.iter().filter(|s| !s.shipping) {
            let index = self
                .products
                .iter()
                .position(|p| p.name == item.name)
                .ok_or_else(|| Error::ProductNotFound(item.name.clone()))?;

            let count = needed.entry(index).or_insert(0);
            *count += 1;
            if *count > self.products[index].stock {
                return Err(Error::OutOfStock(item.name.clone()));
            }
        }

        for (index, count) in needed {
            let product = &mut self.products[index];
            product.stock -= count;
            product.used += count;
            debug!(
                product = %product.name,
                stock = product.stock,
                used = product.used,
                "Stock committed"
            );
        }

        Ok(())
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Catalog::new(products)
    }
}

/// One unit of stock held back while a search explores a branch.
///
/// The unit goes back to the product when the guard drops, on every exit
/// path including unwinding.
pub struct Reservation<'c> {
    catalog: &'c mut Catalog,
    index: usize,
}

impl Reservation<'_> {
    pub fn product(&self) -> &Product {
        &self.catalog.products[self.index]
    }
}

impl Deref for Reservation<'_> {
    type Target = Catalog;

    fn deref(&self) -> &Catalog {
        self.catalog
    }
}

impl DerefMut for Reservation<'_> {
    fn deref_mut(&mut self) -> &mut Catalog {
        self.catalog
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(product) = self.catalog.products.get_mut(self.index) {
            product.stock += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new("Bluzka", 15.0, 25.0, 2),
            Product::new("Guzik", 0.5, 2.0, 0),
            Product::new("Skarpety", 5.0, 9.99, 1),
        ])
    }

    #[test]
    fn test_available_skips_empty_stock() {
        assert_eq!(catalog().available(), vec![0, 2]);
        assert_eq!(catalog().total_stock(), 3);
    }

    #[test]
    fn test_reservation_restores_stock() {
        let mut catalog = catalog();
        {
            let mut first = catalog.reserve(0).unwrap();
            assert_eq!(first.product().stock, 1);
            {
                let second = first.reserve(0).unwrap();
                assert_eq!(second.product().stock, 0);
                assert_eq!(second.available(), vec![2]);
            }
            assert_eq!(first.product().stock, 1);
        }
        assert_eq!(catalog.products()[0].stock, 2);
    }

    #[test]
    fn test_reserve_without_stock() {
        let mut catalog = catalog();
        assert!(catalog.reserve(1).is_none());
        assert!(catalog.reserve(42).is_none());
        assert_eq!(catalog.products()[1].stock, 0);
    }

    #[test]
    fn test_commit_updates_counters() {
        let mut catalog = catalog();
        let selection = vec![
            SelectedProduct::shipping("Wysyłka", 1999),
            SelectedProduct::new("Bluzka", 2000),
            SelectedProduct::new("Bluzka", 2100),
            SelectedProduct::new("Skarpety", 800),
        ];

        catalog.commit(&selection).unwrap();

        let bluzka = catalog.get("Bluzka").unwrap();
        assert_eq!((bluzka.stock, bluzka.used), (0, 2));
        let skarpety = catalog.get("Skarpety").unwrap();
        assert_eq!((skarpety.stock, skarpety.used), (0, 1));
    }

    #[test]
    fn test_commit_unknown_product_changes_nothing() {
        let mut catalog = catalog();
        let before = catalog.clone();

        let result = catalog.commit(&[
            SelectedProduct::new("Bluzka", 2000),
            SelectedProduct::new("Kapelusz", 3000),
        ]);

        assert!(matches!(result, Err(Error::ProductNotFound(name)) if name == "Kapelusz"));
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_commit_over_stock_changes_nothing() {
        let mut catalog = catalog();
        let before = catalog.clone();

        let result = catalog.commit(&[
            SelectedProduct::new("Skarpety", 800),
            SelectedProduct::new("Skarpety", 800),
        ]);

        assert!(matches!(result, Err(Error::OutOfStock(name)) if name == "Skarpety"));
        assert_eq!(catalog, before);
    }
}
