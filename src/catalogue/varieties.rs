//! Varieties
//!
//! A variety is an axis of product configuration (size, colour, engraving) and a variety option
//! is one value on that axis. Products carry options through assignments, optionally at a
//! surcharge, and some combinations of options are stocked as SKUs.

use crate::{catalogue::products::ProductId, ids::TypedId, money::Money};

/// Variety id
pub type VarietyId = TypedId<Variety>;

/// Variety option id
pub type VarietyOptionId = TypedId<VarietyOption>;

/// Product SKU id
pub type ProductSkuId = TypedId<ProductSku>;

/// How a variety is presented to customers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VarietyStyle {
    /// Customers pick one option from a list.
    #[default]
    Select,

    /// Informational attribute, not chosen by the customer.
    Attribute,
}

/// A configuration axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Variety {
    /// Variety id
    pub id: VarietyId,

    /// Display title
    pub title: String,

    /// URL slug
    pub slug: String,

    /// Disabled varieties cannot be selected.
    pub enabled: bool,

    /// Whether options of this variety take part in the SKU matrix.
    pub sku: bool,

    /// Presentation style
    pub style: VarietyStyle,

    /// Optional display unit (e.g. "cm").
    pub unit: Option<String>,
}

/// One value of a variety.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyOption {
    /// Option id
    pub id: VarietyOptionId,

    /// Parent variety
    pub variety_id: VarietyId,

    /// Display title
    pub title: String,

    /// Disabled options cannot be selected.
    pub enabled: bool,

    /// Whether customers can attach free text (e.g. an engraving) to this option.
    pub text_label: bool,

    /// Default surcharge used when a product has no explicit assignment price.
    pub offset: Option<Money>,
}

/// A variety option together with its parent variety.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    /// The option
    pub option: VarietyOption,

    /// Its variety
    pub variety: Variety,
}

impl ResolvedOption {
    /// Option id
    pub fn id(&self) -> VarietyOptionId {
        self.option.id
    }

    /// Whether the option participates in SKU matching.
    pub fn is_sku(&self) -> bool {
        self.variety.sku
    }

    /// Whether both option and variety are enabled.
    pub fn is_selectable(&self) -> bool {
        self.option.enabled && self.variety.enabled
    }

    /// Human readable "Variety: Option" description, with the label appended when present.
    pub fn describe(&self, label: Option<&str>) -> String {
        let unit = self.variety.unit.as_deref().unwrap_or_default();

        match label {
            Some(label) => format!(
                "{}: {}{unit} ({label})",
                self.variety.title, self.option.title
            ),
            None => format!("{}: {}{unit}", self.variety.title, self.option.title),
        }
    }
}

/// Link allowing a product to carry an option at a surcharge.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyAssignment {
    /// Product
    pub product_id: ProductId,

    /// Option
    pub option_id: VarietyOptionId,

    /// Surcharge added per unit.
    pub price: Money,
}

/// A stocked combination of SKU-participating options.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSku {
    /// SKU id
    pub id: ProductSkuId,

    /// Owning product
    pub product_id: ProductId,

    /// Stock keeping code
    pub code: String,

    /// Barcode
    pub barcode: Option<String>,

    /// Per-unit price replacing the product's base price.
    pub price: Option<Money>,

    /// Disabled SKUs never match.
    pub enabled: bool,

    /// The exact option set identifying this SKU.
    pub variety_option_ids: Vec<VarietyOptionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(unit: Option<&str>) -> ResolvedOption {
        ResolvedOption {
            option: VarietyOption {
                id: VarietyOptionId::new(1),
                variety_id: VarietyId::new(1),
                title: "14".to_string(),
                enabled: true,
                text_label: false,
                offset: None,
            },
            variety: Variety {
                id: VarietyId::new(1),
                title: "Size".to_string(),
                slug: "size".to_string(),
                enabled: true,
                sku: true,
                style: VarietyStyle::Select,
                unit: unit.map(ToString::to_string),
            },
        }
    }

    #[test]
    fn describe_includes_unit_and_label() {
        assert_eq!(resolved(None).describe(None), "Size: 14");
        assert_eq!(resolved(Some("cm")).describe(Some("Hi")), "Size: 14cm (Hi)");
    }

    #[test]
    fn disabled_variety_is_not_selectable() {
        let mut option = resolved(None);
        option.variety.enabled = false;

        assert!(!option.is_selectable());
    }
}
