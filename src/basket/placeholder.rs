//! Snapshots
//!
//! Values captured when a basket is sealed. A frozen basket and its frozen lines answer every
//! pricing query from these records. Every field defaults, so a record written by an older
//! version still replays with zeros where data is missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalogue::{
        products::StockMode,
        varieties::{ProductSkuId, VarietyId, VarietyOptionId},
    },
    delivery::DeliveryOptionId,
    money::Money,
};

/// Basket totals at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderTotals {
    /// Sum of line totals
    pub sub_total: Money,

    /// Delivery charge
    pub delivery: Money,

    /// Voucher discount
    pub discount: Money,

    /// Voucher discount with free-delivery vouchers left out. Older records lack it and fall
    /// back to `discount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_excluding_free_delivery: Option<Money>,

    /// Amount payable
    pub total: Money,

    /// Number of units
    pub quantity: u32,
}

/// Basket-level snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasketPlaceholder {
    /// Totals
    pub totals: PlaceholderTotals,

    /// Delivery option the charge was computed for, selected or picked automatically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_option_id: Option<DeliveryOptionId>,

    /// Delivery was to be quoted separately
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_quote_only: bool,

    /// The free delivery threshold was met
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub free_delivery: bool,
}

/// A selected variety option as it was described at snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderVariety {
    /// Option id
    pub id: Option<VarietyOptionId>,

    /// Parent variety
    pub variety_id: Option<VarietyId>,

    /// Variety title
    pub variety: String,

    /// Option title
    pub title: String,

    /// Free-text label, if one was attached
    pub label: Option<String>,
}

/// The SKU a line resolved to at snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderSku {
    /// SKU id
    pub id: Option<ProductSkuId>,

    /// Stock keeping code
    pub code: String,

    /// Barcode
    pub barcode: Option<String>,

    /// Price override
    pub price: Option<Money>,
}

/// Line-level snapshot.
#[expect(clippy::struct_excessive_bools, reason = "mirrors the product flags")]
#[expect(missing_docs, reason = "fields are the stored snapshot keys")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePlaceholder {
    pub title: String,
    pub excerpt: Option<String>,
    pub image_id: Option<u64>,

    /// "Variety: Option" descriptions
    pub variety_data: Vec<String>,

    pub product_price: Money,
    pub total_product: Money,
    pub total_varieties: Money,
    pub total_product_without_deposit: Money,
    pub total: Money,
    pub total_without_deposit: Money,
    pub total_discountable: Money,
    pub quantity: u32,
    pub deposit_only: bool,
    pub deposit: Money,
    pub barcode: Option<String>,
    pub is_pre_order: bool,
    pub is_loan_exempt: bool,
    pub is_exempt_from_free_delivery: bool,
    pub is_exempt_from_discount: bool,
    pub is_non_returnable: bool,
    pub is_collection_only: bool,

    /// Stock tracking of the product, so sealed lines still move stock
    pub stock: StockMode,

    pub part_number: Option<String>,
    pub icon_url: Option<String>,
    pub url: String,
    pub get_absolute_url: String,
    pub get_absolute_url_with_varieties: String,
    pub varieties: Vec<PlaceholderVariety>,
    pub sku: Option<PlaceholderSku>,
    pub custom_properties: BTreeMap<String, String>,
    pub image_attribute_url: Option<String>,
}
