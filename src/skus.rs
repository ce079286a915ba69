//! SKU Resolution

use rustc_hash::FxHashSet;

use crate::catalogue::varieties::{ProductSku, ResolvedOption, VarietyOptionId};

/// Find the SKU whose option set equals the SKU-participating subset of `selected`.
///
/// Returns `None` when no SKU-participating option was selected or nothing matches. A
/// catalogue should never hold two SKUs with the same option set; if it does, the first one
/// in `skus` wins.
pub fn resolve<'s>(skus: &'s [ProductSku], selected: &[ResolvedOption]) -> Option<&'s ProductSku> {
    let wanted: FxHashSet<VarietyOptionId> = selected
        .iter()
        .filter(|option| option.is_sku())
        .map(ResolvedOption::id)
        .collect();

    if wanted.is_empty() {
        return None;
    }

    skus.iter().filter(|sku| sku.enabled).find(|sku| {
        let options: FxHashSet<VarietyOptionId> = sku.variety_option_ids.iter().copied().collect();

        options == wanted
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        catalogue::{
            products::ProductId,
            varieties::{ProductSkuId, Variety, VarietyId, VarietyOption, VarietyStyle},
        },
        money::Money,
    };

    use super::*;

    fn option(id: u64, variety: u64, sku: bool) -> ResolvedOption {
        ResolvedOption {
            option: VarietyOption {
                id: VarietyOptionId::new(id),
                variety_id: VarietyId::new(variety),
                title: format!("Option {id}"),
                enabled: true,
                text_label: false,
                offset: None,
            },
            variety: Variety {
                id: VarietyId::new(variety),
                title: format!("Variety {variety}"),
                slug: format!("variety-{variety}"),
                enabled: true,
                sku,
                style: VarietyStyle::Select,
                unit: None,
            },
        }
    }

    fn sku(id: u64, code: &str, options: &[u64]) -> ProductSku {
        ProductSku {
            id: ProductSkuId::new(id),
            product_id: ProductId::new(1),
            code: code.to_string(),
            barcode: None,
            price: Some(Money::from(2)),
            enabled: true,
            variety_option_ids: options.iter().copied().map(VarietyOptionId::new).collect(),
        }
    }

    #[test]
    fn matches_exact_sku_subset() {
        let skus = [sku(1, "RED12", &[1, 3]), sku(2, "RED14", &[1, 4])];
        let selected = [option(4, 2, true), option(1, 1, true), option(9, 3, false)];

        assert_eq!(resolve(&skus, &selected).map(|sku| sku.code.as_str()), Some("RED14"));
    }

    #[test]
    fn partial_selection_does_not_match() {
        let skus = [sku(1, "RED14", &[1, 4])];
        let selected = [option(1, 1, true)];

        assert!(resolve(&skus, &selected).is_none());
    }

    #[test]
    fn nothing_selected_matches_nothing() {
        let skus = [sku(1, "EMPTY", &[])];

        assert!(resolve(&skus, &[option(9, 3, false)]).is_none());
    }

    #[test]
    fn disabled_skus_are_skipped() {
        let mut disabled = sku(1, "RED14", &[1, 4]);
        disabled.enabled = false;
        let skus = [disabled, sku(2, "RED14-B", &[4, 1])];

        let selected = [option(1, 1, true), option(4, 2, true)];

        assert_eq!(resolve(&skus, &selected).map(|sku| sku.code.as_str()), Some("RED14-B"));
    }

    #[test]
    fn first_wins_on_duplicate_option_sets() {
        let skus = [sku(1, "A", &[1]), sku(2, "B", &[1])];

        assert_eq!(
            resolve(&skus, &[option(1, 1, true)]).map(|sku| sku.code.as_str()),
            Some("A")
        );
    }
}
