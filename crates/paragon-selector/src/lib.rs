//! Product selection for generated receipts.
//!
//! Turns a transaction amount into catalog lines that add up to it exactly.
//!
//! - **Catalog**: products with stock, temporary reservations and commits
//! - **ProductSelector**: randomized backtracking decomposition

pub mod catalog;
pub mod selector;

pub use catalog::{Catalog, Reservation};
pub use selector::{ProductSelector, SelectorSettings};
