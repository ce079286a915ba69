//! Legacy Basket Shape
//!
//! Orders placed before the current dictionary existed store a flatter shape with a top-level
//! `products` list and money in major units (strings or numbers). The same shape is still
//! produced for the admin and analytics views. It is decoded and converted, never extended.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    addresses::Address,
    basket::{
        Basket,
        placeholder::{BasketPlaceholder, LinePlaceholder, PlaceholderTotals},
        serialise::{BasketDict, ItemDict},
    },
    catalogue::{products::ProductId, varieties::VarietyOptionId},
    delivery::DeliveryOptionId,
    finance::FinanceOptionId,
    fingerprint::fingerprint,
    money::Money,
};

/// Totals in the legacy shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyTotals {
    /// Sum of line totals
    pub sub_total: Decimal,

    /// Delivery charge
    pub delivery: Decimal,

    /// Voucher discount
    pub discount: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Number of units
    pub quantity: u32,
}

/// A line in the legacy shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyLine {
    /// Product
    pub product_id: ProductId,

    /// Product title
    #[serde(default)]
    pub title: String,

    /// Units
    #[serde(default)]
    pub quantity: u32,

    /// Selected variety options
    #[serde(default)]
    pub variety_option_ids: Vec<VarietyOptionId>,

    /// "Variety: Option" descriptions
    #[serde(default)]
    pub varieties: Vec<String>,

    /// Custom properties
    #[serde(default)]
    pub custom: BTreeMap<String, String>,

    /// Labels keyed by variety option id
    #[serde(default)]
    pub labels: BTreeMap<VarietyOptionId, String>,

    /// Line fingerprint; recomputed from ids when blank
    #[serde(default)]
    pub hash: String,

    /// Matched SKU code
    #[serde(default)]
    pub sku_code: Option<String>,

    /// Product base price
    #[serde(default)]
    pub product_price: Decimal,

    /// Per-unit charge
    #[serde(default)]
    pub total_product: Decimal,

    /// Line total
    #[serde(default)]
    pub total: Decimal,
}

/// A basket in the legacy shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyBasket {
    /// Lines
    pub products: Vec<LegacyLine>,

    /// Totals
    pub totals: LegacyTotals,

    /// Voucher code
    pub voucher: Option<String>,

    /// Voucher discount
    pub discount_value: Decimal,

    /// Selected delivery option
    pub delivery_option_id: Option<DeliveryOptionId>,

    /// Selected finance option
    pub finance_option_id: Option<FinanceOptionId>,

    /// Deposit paid towards a loan
    pub loan_deposit: Option<Decimal>,

    /// Finance could be offered
    pub is_available_for_loan: bool,

    /// Invoice order
    pub is_invoice: bool,

    /// Invoice reference
    pub invoice_number: Option<String>,

    /// Delivery was to be quoted separately
    pub is_quote_only: bool,

    /// Customer collects in store
    pub click_and_collect: bool,

    /// Billing address
    pub billing_address: Address,

    /// Delivery address
    pub delivery_address: Address,

    /// Total override
    pub custom_total: Option<Decimal>,
}

impl LegacyLine {
    fn into_item(self) -> ItemDict {
        let hash = if self.hash.is_empty() {
            fingerprint(
                self.product_id,
                &self.variety_option_ids,
                self.custom.iter().map(|(key, value)| (key.as_str(), value.as_str())),
                self.labels.iter().map(|(id, text)| (*id, text.as_str())),
            )
        } else {
            self.hash
        };

        let total_product = Money::new(self.total_product);
        let total = Money::new(self.total);

        let placeholder = LinePlaceholder {
            title: self.title,
            variety_data: self.varieties,
            product_price: Money::new(self.product_price),
            total_product,
            total_product_without_deposit: total_product,
            total,
            total_without_deposit: total,
            total_discountable: total,
            quantity: self.quantity,
            custom_properties: self.custom.clone(),
            ..LinePlaceholder::default()
        };

        ItemDict {
            product_id: self.product_id,
            processed: false,
            sku_id: None,
            sku_code: self.sku_code,
            sku_barcode: None,
            custom: self.custom,
            labels: self.labels,
            quantity: self.quantity.max(1),
            hash,
            variety_option_ids: self.variety_option_ids,
            placeholder: Some(placeholder),
        }
    }
}

impl LegacyBasket {
    /// Convert to the current dictionary. Legacy records always come from orders, so the result
    /// is sealed with the recorded totals.
    pub fn into_dict(self) -> BasketDict {
        let placeholder = BasketPlaceholder {
            totals: PlaceholderTotals {
                sub_total: Money::new(self.totals.sub_total),
                delivery: Money::new(self.totals.delivery),
                discount: Money::new(self.totals.discount),
                discount_excluding_free_delivery: None,
                total: Money::new(self.totals.total),
                quantity: self.totals.quantity,
            },
            delivery_option_id: self.delivery_option_id,
            is_quote_only: self.is_quote_only,
            free_delivery: false,
        };

        BasketDict {
            items: self.products.into_iter().map(LegacyLine::into_item).collect(),
            voucher: self.voucher,
            billing_address: self.billing_address,
            delivery_address: self.delivery_address,
            finance_option_id: self.finance_option_id,
            loan_deposit: self.loan_deposit.map(Money::new),
            delivery_option: self.delivery_option_id,
            click_and_collect: self.click_and_collect,
            invoice: self.is_invoice,
            invoice_number: self.invoice_number,
            custom_total: self.custom_total.map(Money::new),
            placeholder: Some(placeholder),
            ..BasketDict::default()
        }
    }

    /// Describe a basket in the legacy shape.
    pub fn from_basket(basket: &Basket<'_>) -> Self {
        let lines = basket
            .items()
            .iter()
            .map(|item| LegacyLine {
                product_id: item.product_id(),
                title: item.title().to_string(),
                quantity: item.quantity(),
                variety_option_ids: item.option_ids().to_vec(),
                varieties: item.variety_descriptions(),
                custom: item.custom().clone(),
                labels: item.labels().clone(),
                hash: item.hash().to_string(),
                sku_code: item.sku().map(|sku| sku.code),
                product_price: item.product_price().amount(),
                total_product: item.total_product().amount(),
                total: item.total().amount(),
            })
            .collect();

        let discount = basket.discount_value();

        LegacyBasket {
            products: lines,
            totals: LegacyTotals {
                sub_total: basket.sub_total().amount(),
                delivery: basket.delivery().amount(),
                discount: discount.amount(),
                total: basket.total().amount(),
                quantity: basket.quantity(),
            },
            voucher: basket.voucher_code().map(ToString::to_string),
            discount_value: discount.amount(),
            delivery_option_id: basket.delivery_option_id(),
            finance_option_id: basket.finance_option_id(),
            loan_deposit: basket.loan_deposit().map(Money::amount),
            is_available_for_loan: basket.is_available_for_loan(),
            is_invoice: basket.is_invoice(),
            invoice_number: basket.invoice_number().map(ToString::to_string),
            is_quote_only: basket.is_quote_only(),
            click_and_collect: basket.is_click_and_collect(),
            billing_address: basket.billing_address().clone(),
            delivery_address: basket.delivery_address().clone(),
            custom_total: basket.custom_total().map(Money::amount),
        }
    }
}
