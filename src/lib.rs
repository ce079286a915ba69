//! Trolley
//!
//! Trolley is a shopping basket engine: it prices lines against a product catalogue, applies
//! vouchers, delivery and finance rules, and freezes baskets into orders that replay exactly.

pub mod addresses;
pub mod basket;
pub mod catalogue;
pub mod config;
pub mod context;
pub mod delivery;
pub mod finance;
pub mod fingerprint;
pub mod fixtures;
pub mod ids;
pub mod money;
pub mod orders;
pub mod prelude;
pub mod receipt;
pub mod skus;
pub mod utils;
pub mod vouchers;
