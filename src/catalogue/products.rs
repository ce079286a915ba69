//! Products

use serde::{Deserialize, Serialize};

use crate::{
    catalogue::varieties::VarietyOptionId, finance::FinanceOptionId, ids::TypedId, money::Money,
};

/// Product id
pub type ProductId = TypedId<Product>;

/// Marker for category ids.
#[derive(Debug)]
pub struct Category;

/// Category id
pub type CategoryId = TypedId<Category>;

/// How a product's stock level is tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMode {
    /// Always available, stock is not tracked.
    #[default]
    Available,

    /// Stock level is decremented automatically when an order is placed.
    Auto,

    /// Not available for purchase.
    OutOfStock,

    /// Manufactured on demand.
    MadeToOrder,
}

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Media id
    pub id: u64,

    /// Public URL of the image.
    pub url: String,
}

/// A catalogue product as seen by the basket.
#[expect(clippy::struct_excessive_bools, reason = "catalogue product flags")]
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Display title
    pub title: String,

    /// URL slug
    pub slug: String,

    /// Short description
    pub excerpt: Option<String>,

    /// Base price, `None` for products without a list price.
    pub price: Option<Money>,

    /// Never discounted by vouchers.
    pub exempt_from_discount: bool,

    /// Excluded from free-delivery thresholds.
    pub exempt_from_free_delivery: bool,

    /// Prevents finance on any basket containing this product.
    pub loan_exempt: bool,

    /// Can only be collected in store.
    pub collection_only: bool,

    /// Sold as a pre-order.
    pub pre_order: bool,

    /// Cannot be returned.
    pub non_returnable: bool,

    /// Customers pay the deposit rather than the price.
    pub deposit_only: bool,

    /// Deposit amount per unit.
    pub deposit: Money,

    /// Unpublished.
    pub draft: bool,

    /// Primary image
    pub image: Option<ImageRef>,

    /// Primary category
    pub category: Option<CategoryId>,

    /// Finance options restricted to this product.
    pub finance_options: Vec<FinanceOptionId>,

    /// Manufacturer part number
    pub part_number: Option<String>,

    /// Product barcode
    pub barcode: Option<String>,

    /// Stock tracking mode
    pub stock: StockMode,

    /// Current stock level, only meaningful for [`StockMode::Auto`].
    pub stock_level: i64,
}

impl Product {
    /// Creates a published product with the given price and no flags set.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Money) -> Self {
        let title = title.into();
        let slug = slugify(&title);

        Product {
            id,
            title,
            slug,
            excerpt: None,
            price: Some(price),
            exempt_from_discount: false,
            exempt_from_free_delivery: false,
            loan_exempt: false,
            collection_only: false,
            pre_order: false,
            non_returnable: false,
            deposit_only: false,
            deposit: Money::ZERO,
            draft: false,
            image: None,
            category: None,
            finance_options: Vec::new(),
            part_number: None,
            barcode: None,
            stock: StockMode::Available,
            stock_level: 0,
        }
    }

    /// Whether the product may be put into a basket at all.
    pub fn can_be_added_to_basket(&self) -> bool {
        if self.draft {
            return false;
        }

        match self.stock {
            StockMode::OutOfStock => false,
            StockMode::Auto => self.stock_level > 0 || self.pre_order,
            StockMode::Available | StockMode::MadeToOrder => true,
        }
    }

    /// Canonical shop URL of the product.
    pub fn absolute_url(&self) -> String {
        format!("/shop/product/{}-{}/", self.slug, self.id)
    }

    /// Shop URL that preselects the given variety options.
    pub fn absolute_url_with_varieties(&self, options: &[VarietyOptionId]) -> String {
        let url = self.absolute_url();

        if options.is_empty() {
            return url;
        }

        let ids = options
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        format!("{url}?varieties={ids}")
    }
}

pub(crate) fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn product() -> Product {
        Product::new(ProductId::new(12), "Oak Dining Table", Money::new(dec!(50)))
    }

    #[test]
    fn new_product_derives_slug() {
        assert_eq!(product().slug, "oak-dining-table");
    }

    #[test]
    fn urls_include_slug_and_id() {
        let product = product();

        assert_eq!(product.absolute_url(), "/shop/product/oak-dining-table-12/");
        assert_eq!(
            product.absolute_url_with_varieties(&[VarietyOptionId::new(3), VarietyOptionId::new(9)]),
            "/shop/product/oak-dining-table-12/?varieties=3,9"
        );
    }

    #[test]
    fn drafts_cannot_be_added() {
        let mut product = product();
        product.draft = true;

        assert!(!product.can_be_added_to_basket());
    }

    #[test]
    fn auto_stock_requires_stock_unless_pre_order() {
        let mut product = product();
        product.stock = StockMode::Auto;

        assert!(!product.can_be_added_to_basket());

        product.pre_order = true;
        assert!(product.can_be_added_to_basket());

        product.pre_order = false;
        product.stock_level = 2;
        assert!(product.can_be_added_to_basket());
    }

    #[test]
    fn out_of_stock_cannot_be_added() {
        let mut product = product();
        product.stock = StockMode::OutOfStock;

        assert!(!product.can_be_added_to_basket());
    }
}
