//! Randomized decomposition of an amount into catalog products.
//!
//! Given a target in minor units, the selector picks products and a price
//! inside each product's range so that the prices add up to the target
//! exactly. The search is a depth-limited backtracking walk over a shuffled
//! catalog, repeated with fresh randomness until one attempt lands on the
//! target.
//!
//! # Pricing
//!
//! For each candidate the price is drawn from the top 30% of
//! `[min, min(max, remaining)]`. Two shortcuts keep receipts short:
//!
//! - a remainder below 1.50 that fits the range is taken as-is
//! - a residual below 5.00 is folded into the current product when its
//!   range covers the whole remainder
//!
//! # Example
//!
//! ```
//! use paragon_core::Product;
//! use paragon_selector::{Catalog, ProductSelector, SelectorSettings};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut catalog = Catalog::new(vec![Product::new("Bluzka", 10.0, 30.0, 5)]);
//! let settings = SelectorSettings { shipping_chance: 0, ..SelectorSettings::default() };
//! let mut selector = ProductSelector::new(settings, StdRng::seed_from_u64(7));
//!
//! let selection = selector.select_products(&mut catalog, 1999).unwrap();
//! assert_eq!(selection.iter().map(|p| p.price).sum::<i64>(), 1999);
//! ```

use paragon_core::{
    Error, Product, Result, SelectedProduct,
    constants::{
        FOLD_RESIDUAL_BELOW, MAX_SELECTION_ATTEMPTS, MAX_SELECTION_DEPTH, PRICE_FLOOR_PERCENT,
        SHIPPING_LINE_NAME, SMALL_REMAINDER,
    },
    format_amount,
};
use rand::{Rng, seq::SliceRandom};
use tracing::{debug, trace};

use crate::catalog::Catalog;

/// Shipping line behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSettings {
    /// Chance in percent (0-100) that a receipt starts with a shipping line.
    pub shipping_chance: u8,

    /// Shipping line price in minor units.
    pub shipping_price: i64,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            shipping_chance: 25,
            shipping_price: 1999,
        }
    }
}

/// Picks products for a target amount using an injected random source.
pub struct ProductSelector<R: Rng> {
    settings: SelectorSettings,
    rng: R,
}

impl<R: Rng> ProductSelector<R> {
    pub fn new(settings: SelectorSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    /// Pick products whose prices add up to `target` minor units.
    ///
    /// Stock is only reserved temporarily during the search; `catalog` is
    /// unchanged when this returns. Apply the result with
    /// [`Catalog::commit`] once the receipt is printed.
    ///
    /// # Errors
    /// - `InvalidAmount` if `target` is not positive
    /// - `NoCombinationFound` when every attempt fails
    /// - `SumMismatch` if the final selection does not add up
    pub fn select_products(
        &mut self,
        catalog: &mut Catalog,
        target: i64,
    ) -> Result<Vec<SelectedProduct>> {
        if target <= 0 {
            return Err(Error::InvalidAmount(target));
        }

        let mut selected = Vec::new();
        let mut remaining = target;

        let roll = self.rng.gen_range(0..100u8);
        if roll < self.settings.shipping_chance && remaining >= self.settings.shipping_price {
            trace!(price = self.settings.shipping_price, "Adding shipping line");
            selected.push(SelectedProduct::shipping(
                SHIPPING_LINE_NAME,
                self.settings.shipping_price,
            ));
            remaining -= self.settings.shipping_price;
        }

        selected.extend(self.find_combination(catalog, remaining)?);

        let actual: i64 = selected.iter().map(|p| p.price).sum();
        if actual != target {
            return Err(Error::SumMismatch {
                expected: target,
                actual,
            });
        }

        debug!(
            target = %format_amount(target),
            lines = selected.len(),
            "Products selected"
        );
        Ok(selected)
    }

    fn find_combination(
        &mut self,
        catalog: &mut Catalog,
        target: i64,
    ) -> Result<Vec<SelectedProduct>> {
        for attempt in 1..=MAX_SELECTION_ATTEMPTS {
            if let Some(found) = self.search(catalog, target, MAX_SELECTION_DEPTH) {
                if found.iter().map(|p| p.price).sum::<i64>() == target {
                    trace!(attempt, "Combination found");
                    return Ok(found);
                }
            }
        }

        Err(Error::NoCombinationFound {
            amount: target,
            attempts: MAX_SELECTION_ATTEMPTS,
        })
    }

    /// One randomized backtracking walk. `None` means this walk failed.
    fn search(
        &mut self,
        catalog: &mut Catalog,
        remaining: i64,
        max_depth: usize,
    ) -> Option<Vec<SelectedProduct>> {
        if remaining <= 0 {
            return Some(Vec::new());
        }
        if max_depth == 0 {
            return None;
        }

        let mut candidates = catalog.available();
        candidates.shuffle(&mut self.rng);

        for index in candidates {
            let product = &catalog.products()[index];
            if product.min_price_minor() > remaining || !product.in_stock() {
                continue;
            }

            let Some(price) = self.pick_price(product, remaining) else {
                continue;
            };
            let name = product.name.clone();
            let residual = remaining - price;

            if residual > 0 && residual < FOLD_RESIDUAL_BELOW && product.accepts_price(remaining) {
                return Some(vec![SelectedProduct::new(name, remaining)]);
            }

            if residual == 0 {
                return Some(vec![SelectedProduct::new(name, price)]);
            }

            let rest = {
                let Some(mut reservation) = catalog.reserve(index) else {
                    continue;
                };
                self.search(&mut reservation, residual, max_depth - 1)
            };

            if let Some(rest) = rest {
                let mut found = Vec::with_capacity(rest.len() + 1);
                found.push(SelectedProduct::new(name, price));
                found.extend(rest);
                return Some(found);
            }
        }

        None
    }

    /// Price for `product` against `remaining`, or `None` if its range
    /// cannot fit.
    fn pick_price(&mut self, product: &Product, remaining: i64) -> Option<i64> {
        let min = product.min_price_minor();

        if remaining < SMALL_REMAINDER && product.accepts_price(remaining) {
            return Some(remaining);
        }

        let max = product.max_price_minor().min(remaining);
        if max < min {
            return None;
        }

        let lower = min + (max - min) * PRICE_FLOOR_PERCENT / 100;
        if lower >= max {
            Some(max)
        } else {
            Some(self.rng.gen_range(lower..=max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;

    fn selector(shipping_chance: u8) -> ProductSelector<StdRng> {
        ProductSelector::new(
            SelectorSettings {
                shipping_chance,
                shipping_price: 1999,
            },
            StdRng::seed_from_u64(42),
        )
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(-1999)]
    fn test_non_positive_target(#[case] target: i64) {
        let mut catalog = Catalog::new(vec![Product::new("Bluzka", 1.0, 100.0, 5)]);
        let result = selector(0).select_products(&mut catalog, target);
        assert!(matches!(result, Err(Error::InvalidAmount(t)) if t == target));
    }

    #[test]
    fn test_price_in_upper_part_of_range() {
        let mut selector = selector(0);
        let product = Product::new("Bluzka", 10.0, 20.0, 1);

        for _ in 0..100 {
            let price = selector.pick_price(&product, 10_000).unwrap();
            assert!((1700..=2000).contains(&price), "price {price}");
        }
    }

    #[test]
    fn test_price_clamped_to_remaining() {
        let mut selector = selector(0);
        let product = Product::new("Bluzka", 10.0, 20.0, 1);

        let price = selector.pick_price(&product, 1200).unwrap();
        assert!((1140..=1200).contains(&price), "price {price}");
        assert_eq!(selector.pick_price(&product, 900), None);
    }

    #[test]
    fn test_small_remainder_taken_exactly() {
        let mut selector = selector(0);
        let product = Product::new("Guzik", 0.5, 2.0, 1);
        assert_eq!(selector.pick_price(&product, 149), Some(149));
    }

    #[test]
    fn test_residual_folded_into_single_line() {
        // Draws land in 10210..=10300, so the residual is always below 5.00.
        let mut catalog = Catalog::new(vec![Product::new("Kurtka", 100.0, 104.0, 1)]);
        let found = selector(0).search(&mut catalog, 10_300, 1).unwrap();
        assert_eq!(found, vec![SelectedProduct::new("Kurtka", 10_300)]);
    }

    #[test]
    fn test_shipping_line_always_added() {
        let mut catalog = Catalog::new(vec![Product::new("Bluzka", 1.0, 50.0, 10)]);
        let selection = selector(100).select_products(&mut catalog, 5000).unwrap();

        assert!(selection[0].shipping);
        assert_eq!(selection[0].name, SHIPPING_LINE_NAME);
        assert_eq!(selection[0].price, 1999);
        assert!(selection[1..].iter().all(|p| !p.shipping));
        assert_eq!(selection.iter().map(|p| p.price).sum::<i64>(), 5000);
    }

    #[test]
    fn test_shipping_skipped_below_its_price() {
        let mut catalog = Catalog::new(vec![Product::new("Bluzka", 1.0, 50.0, 10)]);
        let selection = selector(100).select_products(&mut catalog, 1500).unwrap();
        assert!(selection.iter().all(|p| !p.shipping));
    }

    #[test]
    fn test_shipping_covers_whole_target() {
        let mut catalog = Catalog::new(vec![Product::new("Bluzka", 50.0, 60.0, 1)]);
        let selection = selector(100).select_products(&mut catalog, 1999).unwrap();
        assert_eq!(selection, vec![SelectedProduct::shipping(SHIPPING_LINE_NAME, 1999)]);
    }

    #[test]
    fn test_depth_limit() {
        let mut catalog = Catalog::new(vec![Product::new("Guzik", 1.0, 1.0, 100)]);
        assert!(selector(0).search(&mut catalog, 1100, MAX_SELECTION_DEPTH).is_none());
        assert_eq!(
            selector(0).search(&mut catalog, 1000, MAX_SELECTION_DEPTH).map(|v| v.len()),
            Some(10)
        );
    }

    #[test]
    fn test_stock_limits_repeats() {
        let mut catalog = Catalog::new(vec![Product::new("Guzik", 1.0, 1.0, 2)]);
        assert!(selector(0).search(&mut catalog, 300, MAX_SELECTION_DEPTH).is_none());
        assert_eq!(catalog.products()[0].stock, 2);
    }
}
