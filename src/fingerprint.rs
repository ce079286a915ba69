//! Line Fingerprints
//!
//! A basket line is identified by a SHA-224 digest of its product, variety options, custom
//! properties and labels. Inputs are sorted first so the digest does not depend on the order
//! options were picked or properties were submitted in.

use sha2::{Digest, Sha224};

use crate::catalogue::{
    products::{Product, ProductId},
    varieties::{ResolvedOption, VarietyOptionId},
};

/// Fingerprint of a line described by raw ids.
pub fn fingerprint<'a>(
    product_id: ProductId,
    option_ids: &[VarietyOptionId],
    custom: impl IntoIterator<Item = (&'a str, &'a str)>,
    labels: impl IntoIterator<Item = (VarietyOptionId, &'a str)>,
) -> String {
    let mut option_ids = option_ids.to_vec();
    option_ids.sort_unstable();

    let mut custom: Vec<(&str, &str)> = custom.into_iter().collect();
    custom.sort_unstable();

    let mut labels: Vec<(VarietyOptionId, &str)> = labels.into_iter().collect();
    labels.sort_unstable();

    let mut source = product_id.to_string();

    source.push_str(&join(option_ids.iter().map(ToString::to_string)));
    source.push_str(&join(custom.iter().map(|(key, value)| format!("{key}={value}"))));
    source.push_str(&join(labels.iter().map(|(key, value)| format!("{key}={value}"))));

    format!("{:x}", Sha224::digest(source.as_bytes()))
}

/// Fingerprint of a line described by catalogue records. Produces the same digest as
/// [`fingerprint`] for the same ids.
pub fn line_fingerprint<'a>(
    product: &Product,
    options: &[ResolvedOption],
    custom: impl IntoIterator<Item = (&'a str, &'a str)>,
    labels: impl IntoIterator<Item = (VarietyOptionId, &'a str)>,
) -> String {
    let option_ids: Vec<VarietyOptionId> = options.iter().map(ResolvedOption::id).collect();

    fingerprint(product.id, &option_ids, custom, labels)
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use crate::{
        catalogue::varieties::{Variety, VarietyId, VarietyOption, VarietyStyle},
        money::Money,
    };

    use super::*;

    fn ids(raw: &[u64]) -> Vec<VarietyOptionId> {
        raw.iter().copied().map(VarietyOptionId::new).collect()
    }

    fn resolved(id: u64) -> ResolvedOption {
        ResolvedOption {
            option: VarietyOption {
                id: VarietyOptionId::new(id),
                variety_id: VarietyId::new(1),
                title: id.to_string(),
                enabled: true,
                text_label: false,
                offset: None,
            },
            variety: Variety {
                id: VarietyId::new(1),
                title: "Size".to_string(),
                slug: "size".to_string(),
                enabled: true,
                sku: false,
                style: VarietyStyle::Select,
                unit: None,
            },
        }
    }

    #[test]
    fn digest_is_sha224_hex() {
        let hash = fingerprint(ProductId::new(1), &[], [], []);

        assert_eq!(hash.len(), 56);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_of_known_input() {
        // sha224("12-3a=b")
        let hash = fingerprint(ProductId::new(1), &ids(&[3, 2]), [("a", "b")], []);
        let expected = format!("{:x}", Sha224::digest(b"12-3a=b"));

        assert_eq!(hash, expected);
    }

    #[test]
    fn independent_of_input_order() {
        let first = fingerprint(
            ProductId::new(9),
            &ids(&[5, 1, 3]),
            [("b", "2"), ("a", "1")],
            [(VarietyOptionId::new(3), "Hi"), (VarietyOptionId::new(1), "Yo")],
        );

        let second = fingerprint(
            ProductId::new(9),
            &ids(&[3, 5, 1]),
            [("a", "1"), ("b", "2")],
            [(VarietyOptionId::new(1), "Yo"), (VarietyOptionId::new(3), "Hi")],
        );

        assert_eq!(first, second);
    }

    #[test]
    fn differs_by_custom_properties() {
        let plain = fingerprint(ProductId::new(9), &[], [], []);
        let custom = fingerprint(ProductId::new(9), &[], [("a", "1")], []);

        assert_ne!(plain, custom);
    }

    #[test]
    fn entity_variant_matches_id_variant() {
        let product = Product::new(ProductId::new(4), "Desk", Money::from(1));

        let by_entity = line_fingerprint(&product, &[resolved(8), resolved(2)], [], []);
        let by_id = fingerprint(ProductId::new(4), &ids(&[2, 8]), [], []);

        assert_eq!(by_entity, by_id);
    }
}
