//! Catalogue
//!
//! Read access to the product catalogue, vouchers, delivery and finance options. The basket
//! only ever asks for records in batches keyed by id, so a database-backed implementation can
//! answer a restore with a handful of queries.

use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::{
    delivery::{DeliveryOption, DeliveryOptionId, ProductDeliveryOption},
    finance::FinanceOption,
    vouchers::Voucher,
};

pub mod memory;
pub mod products;
pub mod varieties;

pub use memory::MemoryCatalogue;
pub use products::{Category, CategoryId, ImageRef, Product, ProductId, StockMode};
pub use varieties::{
    ProductSku, ProductSkuId, ResolvedOption, Variety, VarietyAssignment, VarietyId,
    VarietyOption, VarietyOptionId, VarietyStyle,
};

/// Catalogue reads needed by baskets and orders.
pub trait Catalogue: Debug {
    /// Products with the given ids. Unknown ids are absent from the result.
    fn products(&self, ids: &[ProductId]) -> FxHashMap<ProductId, Product>;

    /// Variety options (with their variety) with the given ids.
    fn variety_options(&self, ids: &[VarietyOptionId]) -> FxHashMap<VarietyOptionId, ResolvedOption>;

    /// Variety assignments of the given products.
    fn assignments(&self, products: &[ProductId]) -> Vec<VarietyAssignment>;

    /// SKUs of the given products, in insertion order.
    fn skus(&self, products: &[ProductId]) -> Vec<ProductSku>;

    /// The voucher redeemed by `code` (case-insensitive), with its current usage count.
    fn voucher_by_code(&self, code: &str) -> Option<Voucher>;

    /// All delivery options in display order.
    fn delivery_options(&self) -> Vec<DeliveryOption>;

    /// Per-product overrides of `option` for the given products.
    fn product_delivery_options(
        &self,
        option: DeliveryOptionId,
        products: &[ProductId],
    ) -> Vec<ProductDeliveryOption>;

    /// All finance options.
    fn finance_options(&self) -> Vec<FinanceOption>;

    /// A single product.
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products(&[id]).remove(&id)
    }

    /// A single delivery option.
    fn delivery_option(&self, id: DeliveryOptionId) -> Option<DeliveryOption> {
        self.delivery_options()
            .into_iter()
            .find(|option| option.id == id)
    }
}
