//! Basket Fixtures

use std::collections::BTreeMap;

use serde::Deserialize;

/// Wrapper for a basket in YAML
#[derive(Debug, Default, Deserialize)]
pub struct BasketFixture {
    /// Delivery country ISO code
    #[serde(default)]
    pub country: Option<String>,

    /// Voucher code
    #[serde(default)]
    pub voucher: Option<String>,

    /// Delivery option id
    #[serde(default)]
    pub delivery_option: Option<u64>,

    /// Lines in insertion order
    #[serde(default)]
    pub lines: Vec<LineFixture>,
}

/// Basket line fixture from YAML, referencing products and options by key.
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Product key
    pub product: String,

    /// Quantity
    #[serde(default = "one")]
    pub quantity: i64,

    /// Option keys
    #[serde(default)]
    pub options: Vec<String>,

    /// Custom properties
    #[serde(default)]
    pub custom: BTreeMap<String, String>,

    /// Labels keyed by option key
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

fn one() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn lines_default_to_one_unit() -> TestResult {
        let fixture: BasketFixture =
            serde_norway::from_str("lines:\n  - product: pot\n  - product: shirt\n    quantity: 3\n")?;

        let quantities: Vec<i64> = fixture.lines.iter().map(|line| line.quantity).collect();

        assert_eq!(quantities, [1, 3]);
        assert!(fixture.voucher.is_none());

        Ok(())
    }
}
