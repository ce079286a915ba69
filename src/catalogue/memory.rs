//! In-memory Catalogue

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::{
    catalogue::{
        Catalogue,
        products::{Product, ProductId, StockMode},
        varieties::{
            ProductSku, ResolvedOption, Variety, VarietyAssignment, VarietyId, VarietyOption,
            VarietyOptionId,
        },
    },
    delivery::{DeliveryOption, DeliveryOptionId, ProductDeliveryOption},
    finance::FinanceOption,
    money::Money,
    vouchers::Voucher,
};

/// A catalogue held entirely in memory, used by fixtures, tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogue {
    products: FxHashMap<ProductId, Product>,
    varieties: FxHashMap<VarietyId, Variety>,
    options: FxHashMap<VarietyOptionId, VarietyOption>,
    assignments: Vec<VarietyAssignment>,
    skus: Vec<ProductSku>,
    vouchers: Vec<Voucher>,
    delivery_options: Vec<DeliveryOption>,
    product_delivery_options: Vec<ProductDeliveryOption>,
    finance_options: Vec<FinanceOption>,
}

impl MemoryCatalogue {
    /// Create an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a product.
    pub fn insert_product(&mut self, product: Product) -> &mut Self {
        self.products.insert(product.id, product);
        self
    }

    /// Add or replace a variety.
    pub fn insert_variety(&mut self, variety: Variety) -> &mut Self {
        self.varieties.insert(variety.id, variety);
        self
    }

    /// Add or replace a variety option.
    pub fn insert_variety_option(&mut self, option: VarietyOption) -> &mut Self {
        self.options.insert(option.id, option);
        self
    }

    /// Let `product` carry `option` at `price`.
    pub fn assign(&mut self, product: ProductId, option: VarietyOptionId, price: Money) -> &mut Self {
        self.assignments
            .retain(|entry| !(entry.product_id == product && entry.option_id == option));

        self.assignments.push(VarietyAssignment {
            product_id: product,
            option_id: option,
            price,
        });

        self
    }

    /// Add a SKU.
    pub fn insert_sku(&mut self, sku: ProductSku) -> &mut Self {
        self.skus.push(sku);
        self
    }

    /// Add or replace a voucher (matched by code).
    pub fn insert_voucher(&mut self, voucher: Voucher) -> &mut Self {
        self.vouchers
            .retain(|existing| !existing.matches_code(&voucher.code));

        self.vouchers.push(voucher);
        self
    }

    /// Add or replace a delivery option, keeping display order.
    pub fn insert_delivery_option(&mut self, option: DeliveryOption) -> &mut Self {
        if let Some(existing) = self
            .delivery_options
            .iter_mut()
            .find(|existing| existing.id == option.id)
        {
            *existing = option;
        } else {
            self.delivery_options.push(option);
        }

        self
    }

    /// Add a per-product delivery override.
    pub fn insert_product_delivery_option(&mut self, entry: ProductDeliveryOption) -> &mut Self {
        self.product_delivery_options.retain(|existing| {
            !(existing.product_id == entry.product_id && existing.option_id == entry.option_id)
        });

        self.product_delivery_options.push(entry);
        self
    }

    /// Add a finance option.
    pub fn insert_finance_option(&mut self, option: FinanceOption) -> &mut Self {
        self.finance_options.retain(|existing| existing.id != option.id);
        self.finance_options.push(option);
        self
    }

    /// Mutable access to a product.
    pub fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.get_mut(&id)
    }

    /// Change a product's base price.
    pub fn set_product_price(&mut self, id: ProductId, price: Money) -> bool {
        self.product_mut(id)
            .map(|product| product.price = Some(price))
            .is_some()
    }

    /// Delete a product along with its assignments and SKUs.
    pub fn remove_product(&mut self, id: ProductId) -> Option<Product> {
        self.assignments.retain(|entry| entry.product_id != id);
        self.skus.retain(|sku| sku.product_id != id);
        self.product_delivery_options
            .retain(|entry| entry.product_id != id);

        self.products.remove(&id)
    }

    /// Mutable access to a voucher by code.
    pub fn voucher_mut(&mut self, code: &str) -> Option<&mut Voucher> {
        self.vouchers
            .iter_mut()
            .find(|voucher| voucher.matches_code(code))
    }

    /// Change a voucher's discount value.
    pub fn set_voucher_value(&mut self, code: &str, value: Decimal) -> bool {
        self.voucher_mut(code)
            .map(|voucher| voucher.discount_value = value)
            .is_some()
    }

    /// Apply a stock movement to a product tracked with [`StockMode::Auto`]. Other products are
    /// left alone.
    pub fn adjust_stock(&mut self, id: ProductId, delta: i64) -> bool {
        match self.products.get_mut(&id) {
            Some(product) if product.stock == StockMode::Auto => {
                product.stock_level = product.stock_level.saturating_add(delta);
                true
            }
            _ => false,
        }
    }

    /// Delete a voucher by code.
    pub fn remove_voucher(&mut self, code: &str) -> Option<Voucher> {
        let index = self
            .vouchers
            .iter()
            .position(|voucher| voucher.matches_code(code))?;

        Some(self.vouchers.remove(index))
    }

    /// Count one more confirmed order against a voucher.
    pub fn record_voucher_use(&mut self, code: &str) -> bool {
        self.voucher_mut(code)
            .map(|voucher| voucher.used = voucher.used.saturating_add(1))
            .is_some()
    }

    /// Delete a delivery option.
    pub fn remove_delivery_option(&mut self, id: DeliveryOptionId) -> Option<DeliveryOption> {
        let index = self
            .delivery_options
            .iter()
            .position(|option| option.id == id)?;

        Some(self.delivery_options.remove(index))
    }
}

impl Catalogue for MemoryCatalogue {
    fn products(&self, ids: &[ProductId]) -> FxHashMap<ProductId, Product> {
        ids.iter()
            .filter_map(|id| self.products.get(id).map(|product| (*id, product.clone())))
            .collect()
    }

    fn variety_options(&self, ids: &[VarietyOptionId]) -> FxHashMap<VarietyOptionId, ResolvedOption> {
        ids.iter()
            .filter_map(|id| {
                let option = self.options.get(id)?;
                let variety = self.varieties.get(&option.variety_id)?;

                Some((
                    *id,
                    ResolvedOption {
                        option: option.clone(),
                        variety: variety.clone(),
                    },
                ))
            })
            .collect()
    }

    fn assignments(&self, products: &[ProductId]) -> Vec<VarietyAssignment> {
        self.assignments
            .iter()
            .filter(|entry| products.contains(&entry.product_id))
            .cloned()
            .collect()
    }

    fn skus(&self, products: &[ProductId]) -> Vec<ProductSku> {
        self.skus
            .iter()
            .filter(|sku| products.contains(&sku.product_id))
            .cloned()
            .collect()
    }

    fn voucher_by_code(&self, code: &str) -> Option<Voucher> {
        self.vouchers
            .iter()
            .find(|voucher| voucher.matches_code(code))
            .cloned()
    }

    fn delivery_options(&self) -> Vec<DeliveryOption> {
        self.delivery_options.clone()
    }

    fn product_delivery_options(
        &self,
        option: DeliveryOptionId,
        products: &[ProductId],
    ) -> Vec<ProductDeliveryOption> {
        self.product_delivery_options
            .iter()
            .filter(|entry| entry.option_id == option && products.contains(&entry.product_id))
            .cloned()
            .collect()
    }

    fn finance_options(&self) -> Vec<FinanceOption> {
        self.finance_options.clone()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::vouchers::{DiscountType, VoucherId};

    use super::*;

    #[test]
    fn batch_lookups_skip_unknown_ids() {
        let mut catalogue = MemoryCatalogue::new();
        catalogue.insert_product(Product::new(ProductId::new(1), "Chair", Money::from(10)));

        let products = catalogue.products(&[ProductId::new(1), ProductId::new(2)]);

        assert_eq!(products.len(), 1);
        assert!(products.contains_key(&ProductId::new(1)));
    }

    #[test]
    fn removing_a_product_removes_its_assignments() {
        let mut catalogue = MemoryCatalogue::new();
        catalogue
            .insert_product(Product::new(ProductId::new(1), "Chair", Money::from(10)))
            .assign(ProductId::new(1), VarietyOptionId::new(4), Money::from(2));

        catalogue.remove_product(ProductId::new(1));

        assert!(catalogue.product(ProductId::new(1)).is_none());
        assert!(catalogue.assignments(&[ProductId::new(1)]).is_empty());
    }

    #[test]
    fn voucher_usage_is_recorded() {
        let mut catalogue = MemoryCatalogue::new();
        catalogue.insert_voucher(Voucher::new(
            VoucherId::new(1),
            "TEN",
            DiscountType::Percentage,
            dec!(10),
        ));

        assert!(catalogue.record_voucher_use("ten"));
        assert_eq!(catalogue.voucher_by_code("TEN").map(|voucher| voucher.used), Some(1));
        assert!(!catalogue.record_voucher_use("missing"));
    }

    #[test]
    fn stock_moves_only_for_auto_products() {
        let mut auto = Product::new(ProductId::new(1), "Chair", Money::from(10));
        auto.stock = StockMode::Auto;
        auto.stock_level = 5;

        let mut catalogue = MemoryCatalogue::new();
        catalogue
            .insert_product(auto)
            .insert_product(Product::new(ProductId::new(2), "Desk", Money::from(90)));

        assert!(catalogue.adjust_stock(ProductId::new(1), -2));
        assert!(!catalogue.adjust_stock(ProductId::new(2), -2));
        assert_eq!(catalogue.product(ProductId::new(1)).map(|product| product.stock_level), Some(3));
        assert_eq!(catalogue.product(ProductId::new(2)).map(|product| product.stock_level), Some(0));
    }
}
