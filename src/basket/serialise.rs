//! Stored Baskets
//!
//! The dictionary a basket is saved as, both in the session and on orders. Money is stored as
//! integer minor units. Keys are stable; every field defaults so older records still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    addresses::Address,
    basket::{
        legacy::LegacyBasket,
        placeholder::{BasketPlaceholder, LinePlaceholder},
    },
    catalogue::{
        products::ProductId,
        varieties::{ProductSkuId, VarietyOptionId},
    },
    delivery::DeliveryOptionId,
    finance::FinanceOptionId,
    money::Money,
};

/// Errors decoding a stored basket.
#[derive(Debug, Error)]
pub enum BasketRecordError {
    /// The value is not a basket dictionary of either shape.
    #[error("invalid basket record")]
    Invalid(#[from] serde_json::Error),

    /// The value is not a JSON object.
    #[error("basket record must be an object, found {0}")]
    NotAnObject(&'static str),
}

fn one() -> u32 {
    1
}

/// A stored basket line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDict {
    /// Product
    pub product_id: ProductId,

    /// Backend bookkeeping flag
    #[serde(default)]
    pub processed: bool,

    /// Matched SKU
    #[serde(default)]
    pub sku_id: Option<ProductSkuId>,

    /// Matched SKU code
    #[serde(default)]
    pub sku_code: Option<String>,

    /// Matched SKU barcode
    #[serde(default)]
    pub sku_barcode: Option<String>,

    /// Custom properties
    #[serde(default)]
    pub custom: BTreeMap<String, String>,

    /// Labels keyed by variety option id
    #[serde(default)]
    pub labels: BTreeMap<VarietyOptionId, String>,

    /// Units
    #[serde(default = "one")]
    pub quantity: u32,

    /// Line fingerprint
    #[serde(default)]
    pub hash: String,

    /// Selected variety options
    #[serde(default)]
    pub variety_option_ids: Vec<VarietyOptionId>,

    /// Snapshot, present on sealed records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<LinePlaceholder>,
}

/// A stored basket.
#[expect(clippy::struct_excessive_bools, reason = "stored checkout flags")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct BasketDict {
    /// Lines in insertion order
    pub items: Vec<ItemDict>,

    /// Voucher code
    pub voucher: Option<String>,

    /// Billing address
    pub billing_address: Address,

    /// Delivery address
    pub delivery_address: Address,

    /// Selected finance option
    pub finance_option_id: Option<FinanceOptionId>,

    /// Deposit paid towards a loan
    pub loan_deposit: Option<Money>,

    /// Newsletter opt-in
    pub newsletter: bool,

    /// Create an account at checkout
    pub signup: bool,

    /// Save addresses to the customer profile
    pub update_profile: bool,

    /// Terms accepted
    pub terms: bool,

    /// Special requirements
    pub special_req: Option<String>,

    /// Survey answer
    pub survey: Option<String>,

    /// Selected delivery option
    pub delivery_option: Option<DeliveryOptionId>,

    /// Customer collects in store
    pub click_and_collect: bool,

    /// Delivery address qualifies for free delivery
    pub free_delivery_to: bool,

    /// Invoice order
    pub invoice: bool,

    /// Invoice reference
    pub invoice_number: Option<String>,

    /// Deliver to the billing address
    pub default_delivery: bool,

    /// Billing address may be edited
    pub can_edit_billing_address: bool,

    /// Delivery address may be edited
    pub can_edit_delivery_address: bool,

    /// Total override
    pub custom_total: Option<Money>,

    /// Session records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_frozen: Option<bool>,

    /// Session records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unable_to_restore: Option<bool>,

    /// Snapshot, present on sealed records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<BasketPlaceholder>,
}

impl BasketDict {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> Result<Value, BasketRecordError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A stored basket in either of its historical shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum BasketRecord {
    /// The current dictionary.
    Current(BasketDict),

    /// The older shape, recognised by its top-level `products` key.
    Legacy(LegacyBasket),
}

impl BasketRecord {
    /// Decode a stored basket, detecting its shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or does not decode.
    pub fn from_json(value: Value) -> Result<Self, BasketRecordError> {
        let object = match &value {
            Value::Object(object) => object,
            Value::Null => return Err(BasketRecordError::NotAnObject("null")),
            Value::Bool(_) => return Err(BasketRecordError::NotAnObject("a boolean")),
            Value::Number(_) => return Err(BasketRecordError::NotAnObject("a number")),
            Value::String(_) => return Err(BasketRecordError::NotAnObject("a string")),
            Value::Array(_) => return Err(BasketRecordError::NotAnObject("an array")),
        };

        if object.contains_key("products") {
            Ok(BasketRecord::Legacy(serde_json::from_value(value)?))
        } else {
            Ok(BasketRecord::Current(serde_json::from_value(value)?))
        }
    }

    /// The record in the current shape.
    pub fn into_dict(self) -> BasketDict {
        match self {
            BasketRecord::Current(dict) => dict,
            BasketRecord::Legacy(legacy) => legacy.into_dict(),
        }
    }
}
