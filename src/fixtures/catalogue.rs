//! Catalogue Fixtures

use std::str::FromStr;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    catalogue::{
        products::{CategoryId, Product, ProductId, StockMode},
        varieties::{ProductSku, ProductSkuId, Variety, VarietyId, VarietyOption, VarietyOptionId},
    },
    delivery::{DeliveryOption, DeliveryOptionId, ProductDeliveryOption},
    finance::{FinanceOption, FinanceOptionId},
    fixtures::FixtureError,
    money::Money,
    vouchers::{DiscountType, Voucher, VoucherId},
};

/// Wrapper for a catalogue in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogueFixture {
    /// Currency code
    #[serde(default)]
    pub currency: Option<String>,

    /// Map of product key -> product fixture
    #[serde(default)]
    pub products: FxHashMap<String, ProductFixture>,

    /// Map of variety key -> variety fixture
    #[serde(default)]
    pub varieties: FxHashMap<String, VarietyFixture>,

    /// Product/option links
    #[serde(default)]
    pub assignments: Vec<AssignmentFixture>,

    /// Stocked option combinations
    #[serde(default)]
    pub skus: Vec<SkuFixture>,

    /// Map of voucher key -> voucher fixture
    #[serde(default)]
    pub vouchers: FxHashMap<String, VoucherFixture>,

    /// Delivery options in display order
    #[serde(default)]
    pub delivery_options: Vec<DeliveryOptionFixture>,

    /// Per-product delivery charges
    #[serde(default)]
    pub product_delivery_options: Vec<ProductDeliveryFixture>,

    /// Finance options
    #[serde(default)]
    pub finance_options: Vec<FinanceOptionFixture>,
}

/// Product fixture from YAML
#[expect(clippy::struct_excessive_bools, reason = "mirrors the product flags")]
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Primary key
    pub id: u64,

    /// Display title
    pub title: String,

    /// Price, e.g. "50.00"
    pub price: String,

    /// Primary category
    #[serde(default)]
    pub category: Option<u64>,

    /// Deposit per unit
    #[serde(default)]
    pub deposit: Option<String>,

    /// Customers pay the deposit
    #[serde(default)]
    pub deposit_only: bool,

    /// Sold as a pre-order
    #[serde(default)]
    pub pre_order: bool,

    /// Never discounted
    #[serde(default)]
    pub exempt_from_discount: bool,

    /// Excluded from free delivery
    #[serde(default)]
    pub exempt_from_free_delivery: bool,

    /// Blocks finance
    #[serde(default)]
    pub loan_exempt: bool,

    /// Stock mode
    #[serde(default)]
    pub stock: StockMode,

    /// Stock level
    #[serde(default)]
    pub stock_level: i64,
}

impl TryFrom<ProductFixture> for Product {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let mut product = Product::new(
            ProductId::new(fixture.id),
            fixture.title,
            parse_price(&fixture.price)?,
        );

        product.category = fixture.category.map(CategoryId::new);
        product.deposit = fixture
            .deposit
            .as_deref()
            .map(parse_price)
            .transpose()?
            .unwrap_or_default();
        product.deposit_only = fixture.deposit_only;
        product.pre_order = fixture.pre_order;
        product.exempt_from_discount = fixture.exempt_from_discount;
        product.exempt_from_free_delivery = fixture.exempt_from_free_delivery;
        product.loan_exempt = fixture.loan_exempt;
        product.stock = fixture.stock;
        product.stock_level = fixture.stock_level;

        Ok(product)
    }
}

/// Variety fixture from YAML
#[derive(Debug, Deserialize)]
pub struct VarietyFixture {
    /// Primary key
    pub id: u64,

    /// Display title
    pub title: String,

    /// Takes part in SKU matching
    #[serde(default)]
    pub sku: bool,

    /// Map of option key -> option fixture
    pub options: FxHashMap<String, OptionFixture>,
}

impl VarietyFixture {
    /// The variety record.
    pub fn variety(&self) -> Variety {
        Variety {
            id: VarietyId::new(self.id),
            title: self.title.clone(),
            slug: crate::catalogue::products::slugify(&self.title),
            enabled: true,
            sku: self.sku,
            style: crate::catalogue::varieties::VarietyStyle::Select,
            unit: None,
        }
    }
}

/// Variety option fixture from YAML
#[derive(Debug, Deserialize)]
pub struct OptionFixture {
    /// Primary key
    pub id: u64,

    /// Display title
    pub title: String,

    /// Accepts a free-text label
    #[serde(default)]
    pub text_label: bool,

    /// Default surcharge
    #[serde(default)]
    pub offset: Option<String>,
}

impl OptionFixture {
    /// The option record, belonging to `variety`.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is not a decimal amount.
    pub fn option(&self, variety: VarietyId) -> Result<VarietyOption, FixtureError> {
        Ok(VarietyOption {
            id: VarietyOptionId::new(self.id),
            variety_id: variety,
            title: self.title.clone(),
            enabled: true,
            text_label: self.text_label,
            offset: self.offset.as_deref().map(parse_price).transpose()?,
        })
    }
}

/// Assignment fixture from YAML, referencing products and options by key.
#[derive(Debug, Deserialize)]
pub struct AssignmentFixture {
    /// Product key
    pub product: String,

    /// Option key
    pub option: String,

    /// Surcharge
    pub price: String,
}

/// SKU fixture from YAML, referencing products and options by key.
#[derive(Debug, Deserialize)]
pub struct SkuFixture {
    /// Primary key
    pub id: u64,

    /// Product key
    pub product: String,

    /// Stock keeping code
    pub code: String,

    /// Replacement unit price
    #[serde(default)]
    pub price: Option<String>,

    /// Option keys
    pub options: Vec<String>,
}

impl SkuFixture {
    /// The SKU record with resolved ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is not a decimal amount.
    pub fn sku(
        &self,
        product_id: ProductId,
        option_ids: Vec<VarietyOptionId>,
    ) -> Result<ProductSku, FixtureError> {
        Ok(ProductSku {
            id: ProductSkuId::new(self.id),
            product_id,
            code: self.code.clone(),
            barcode: None,
            price: self.price.as_deref().map(parse_price).transpose()?,
            enabled: true,
            variety_option_ids: option_ids,
        })
    }
}

/// Voucher fixture from YAML
#[derive(Debug, Deserialize)]
pub struct VoucherFixture {
    /// Primary key
    pub id: u64,

    /// Redemption code
    pub code: String,

    /// Discount kind
    #[serde(rename = "type")]
    pub discount_type: DiscountType,

    /// Percentage or amount
    #[serde(default)]
    pub value: Option<String>,

    /// Delivery countries the voucher is restricted to
    #[serde(default)]
    pub countries: Vec<String>,

    /// Categories the voucher is restricted to
    #[serde(default)]
    pub categories: Vec<u64>,
}

impl TryFrom<VoucherFixture> for Voucher {
    type Error = FixtureError;

    fn try_from(fixture: VoucherFixture) -> Result<Self, Self::Error> {
        let value = fixture
            .value
            .as_deref()
            .map(parse_decimal)
            .transpose()?
            .unwrap_or_default();

        let mut voucher = Voucher::new(
            VoucherId::new(fixture.id),
            fixture.code,
            fixture.discount_type,
            value,
        );

        voucher.countries = fixture.countries;
        voucher.categories = fixture.categories.into_iter().map(CategoryId::new).collect();

        Ok(voucher)
    }
}

/// Delivery option fixture from YAML
#[derive(Debug, Deserialize)]
pub struct DeliveryOptionFixture {
    /// Primary key
    pub id: u64,

    /// Display title
    pub title: String,

    /// UK charge; the option delivers to the UK when set.
    #[serde(default)]
    pub uk: Option<String>,

    /// EU charge; the option delivers to the EU when set.
    #[serde(default)]
    pub eu: Option<String>,

    /// Rest of world charge; the option delivers worldwide when set.
    #[serde(default)]
    pub world: Option<String>,

    /// Free UK delivery at or above this total
    #[serde(default)]
    pub free_delivery_threshold: Option<String>,
}

impl TryFrom<DeliveryOptionFixture> for DeliveryOption {
    type Error = FixtureError;

    fn try_from(fixture: DeliveryOptionFixture) -> Result<Self, Self::Error> {
        let uk = fixture.uk.as_deref().map(parse_price).transpose()?;
        let eu = fixture.eu.as_deref().map(parse_price).transpose()?;
        let world = fixture.world.as_deref().map(parse_price).transpose()?;
        let threshold = fixture
            .free_delivery_threshold
            .as_deref()
            .map(parse_price)
            .transpose()?;

        let mut option = DeliveryOption::new(
            DeliveryOptionId::new(fixture.id),
            fixture.title,
            uk.unwrap_or_default(),
        );

        option.uk_def = uk;
        option.eu_def = eu;
        option.world_def = world;
        option.deliver_uk = uk.is_some();
        option.deliver_eu = eu.is_some();
        option.deliver_world = world.is_some();
        option.free_delivery = threshold.is_some();
        option.free_delivery_threshold = threshold;

        Ok(option)
    }
}

/// Per-product delivery charge fixture from YAML.
#[derive(Debug, Deserialize)]
pub struct ProductDeliveryFixture {
    /// Product key
    pub product: String,

    /// Delivery option id
    pub option: u64,

    /// UK charge
    #[serde(default)]
    pub uk: Option<String>,

    /// EU charge
    #[serde(default)]
    pub eu: Option<String>,

    /// Rest of world charge
    #[serde(default)]
    pub world: Option<String>,
}

impl ProductDeliveryFixture {
    /// The override record for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a charge is not a decimal amount.
    pub fn entry(&self, product_id: ProductId) -> Result<ProductDeliveryOption, FixtureError> {
        Ok(ProductDeliveryOption {
            product_id,
            option_id: DeliveryOptionId::new(self.option),
            uk: self.uk.as_deref().map(parse_price).transpose()?,
            eu: self.eu.as_deref().map(parse_price).transpose()?,
            world: self.world.as_deref().map(parse_price).transpose()?,
        })
    }
}

/// Finance option fixture from YAML
#[derive(Debug, Deserialize)]
pub struct FinanceOptionFixture {
    /// Primary key
    pub id: u64,

    /// Display title
    pub title: String,

    /// Smallest basket total offered this option
    pub min_basket_value: String,

    /// Only offered for products listing it
    #[serde(default)]
    pub per_product: bool,
}

impl TryFrom<FinanceOptionFixture> for FinanceOption {
    type Error = FixtureError;

    fn try_from(fixture: FinanceOptionFixture) -> Result<Self, Self::Error> {
        Ok(FinanceOption {
            id: FinanceOptionId::new(fixture.id),
            title: fixture.title,
            enabled: true,
            seq: i32::try_from(fixture.id).unwrap_or(i32::MAX),
            min_basket_value: parse_price(&fixture.min_basket_value)?,
            per_product: fixture.per_product,
        })
    }
}

/// Parse a decimal amount such as `"50.00"`.
///
/// # Errors
///
/// Returns an error if the string is not a decimal number.
pub fn parse_price(price: &str) -> Result<Money, FixtureError> {
    parse_decimal(price).map(Money::new)
}

fn parse_decimal(value: &str) -> Result<Decimal, FixtureError> {
    Decimal::from_str(value.trim()).map_err(|_err| FixtureError::InvalidPrice(value.to_string()))
}
