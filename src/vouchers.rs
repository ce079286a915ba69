//! Vouchers
//!
//! Voucher applicability (enabled flag, validity window, usage cap, category and delivery
//! country restrictions) and the discount each voucher kind grants.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{catalogue::products::CategoryId, ids::TypedId, money::Money};

/// Voucher id
pub type VoucherId = TypedId<Voucher>;

/// What a voucher takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// A percentage of the discountable sub-total.
    Percentage,

    /// A fixed amount, capped at the discountable sub-total.
    FixedPrice,

    /// The delivery charge.
    FreeDelivery,
}

/// A voucher code customers can redeem.
#[derive(Debug, Clone, PartialEq)]
pub struct Voucher {
    /// Voucher id
    pub id: VoucherId,

    /// Redemption code, matched case-insensitively.
    pub code: String,

    /// Display title
    pub title: String,

    /// Disabled vouchers are never accepted.
    pub enabled: bool,

    /// Discount kind
    pub discount_type: DiscountType,

    /// Percentage points for [`DiscountType::Percentage`], major units for
    /// [`DiscountType::FixedPrice`]. Unused for free delivery.
    pub discount_value: Decimal,

    /// First day the voucher is valid (inclusive).
    pub valid_from: Option<Date>,

    /// Last day the voucher is valid (inclusive).
    pub valid_until: Option<Date>,

    /// Maximum number of confirmed orders that may use the voucher.
    pub max_usage: Option<u32>,

    /// Number of confirmed orders already referencing the voucher.
    pub used: u32,

    /// Categories the voucher is restricted to. Empty means unrestricted.
    pub categories: Vec<CategoryId>,

    /// Delivery countries (ISO codes) the voucher is restricted to. Empty means unrestricted.
    pub countries: Vec<String>,
}

impl Voucher {
    /// Creates an enabled, unrestricted voucher.
    #[must_use]
    pub fn new(
        id: VoucherId,
        code: impl Into<String>,
        discount_type: DiscountType,
        discount_value: Decimal,
    ) -> Self {
        let code = code.into();

        Voucher {
            id,
            title: code.clone(),
            code,
            enabled: true,
            discount_type,
            discount_value,
            valid_from: None,
            valid_until: None,
            max_usage: None,
            used: 0,
            categories: Vec::new(),
            countries: Vec::new(),
        }
    }

    /// Whether `code` redeems this voucher.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// Whether the validity window covers `date`.
    pub fn applies_at(&self, date: Date) -> bool {
        self.valid_from.is_none_or(|from| from <= date)
            && self.valid_until.is_none_or(|until| until >= date)
    }

    /// Whether the usage cap has room left.
    pub fn is_available(&self) -> bool {
        self.max_usage.is_none_or(|max| self.used < max)
    }

    /// Whether the voucher restricts categories.
    pub fn restricts_categories(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Whether a product in `category` is covered by the category restriction.
    pub fn covers_category(&self, category: Option<CategoryId>) -> bool {
        !self.restricts_categories()
            || category.is_some_and(|category| self.categories.contains(&category))
    }

    /// Whether the voucher should be offered for a basket with products in the given categories.
    pub fn visible_for(
        &self,
        categories: impl IntoIterator<Item = Option<CategoryId>>,
        today: Date,
    ) -> bool {
        if !self.enabled || !self.applies_at(today) || !self.is_available() {
            return false;
        }

        !self.restricts_categories()
            || categories
                .into_iter()
                .any(|category| self.covers_category(category))
    }

    /// Whether the delivery country restriction allows `country`.
    pub fn matches_delivery_country(&self, country: Option<&str>) -> bool {
        if self.countries.is_empty() {
            return true;
        }

        country.is_some_and(|country| {
            self.countries
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(country))
        })
    }

    /// The amount taken off a basket.
    ///
    /// Free-delivery vouchers only count when `include_free_delivery` is set, which lets the
    /// delivery calculator ask for the discount without recursing into itself.
    pub fn discount_amount(
        &self,
        discountable_sub_total: Money,
        delivery_charge: Money,
        delivery_country: Option<&str>,
        include_free_delivery: bool,
    ) -> Money {
        match self.discount_type {
            DiscountType::Percentage => {
                let percent = self.discount_value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

                discountable_sub_total
                    .percent(percent)
                    .round_up_cent()
                    .min(discountable_sub_total)
                    .non_negative()
            }
            DiscountType::FixedPrice => Money::new(self.discount_value)
                .non_negative()
                .min(discountable_sub_total.non_negative()),
            DiscountType::FreeDelivery => {
                if include_free_delivery && self.matches_delivery_country(delivery_country) {
                    delivery_charge
                } else {
                    Money::ZERO
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;

    use super::*;

    fn voucher(discount_type: DiscountType, value: Decimal) -> Voucher {
        Voucher::new(VoucherId::new(1), "SAVE", discount_type, value)
    }

    #[test]
    fn codes_match_case_insensitively() {
        let voucher = voucher(DiscountType::Percentage, dec!(10));

        assert!(voucher.matches_code("save"));
        assert!(voucher.matches_code(" Save "));
        assert!(!voucher.matches_code("saver"));
    }

    #[test]
    fn window_is_inclusive() {
        let mut voucher = voucher(DiscountType::Percentage, dec!(10));
        voucher.valid_from = Some(date(2024, 1, 1));
        voucher.valid_until = Some(date(2024, 1, 31));

        assert!(voucher.applies_at(date(2024, 1, 1)));
        assert!(voucher.applies_at(date(2024, 1, 31)));
        assert!(!voucher.applies_at(date(2023, 12, 31)));
        assert!(!voucher.applies_at(date(2024, 2, 1)));
    }

    #[test]
    fn usage_cap() {
        let mut voucher = voucher(DiscountType::Percentage, dec!(10));
        voucher.max_usage = Some(2);
        voucher.used = 1;

        assert!(voucher.is_available());

        voucher.used = 2;
        assert!(!voucher.is_available());
    }

    #[test]
    fn visible_requires_matching_category() {
        let mut voucher = voucher(DiscountType::Percentage, dec!(10));
        voucher.categories = vec![CategoryId::new(5)];
        let today = date(2024, 6, 1);

        assert!(!voucher.visible_for([None, Some(CategoryId::new(4))], today));
        assert!(voucher.visible_for([Some(CategoryId::new(5))], today));

        voucher.enabled = false;
        assert!(!voucher.visible_for([Some(CategoryId::new(5))], today));
    }

    #[test]
    fn country_restriction() {
        let mut voucher = voucher(DiscountType::FreeDelivery, Decimal::ZERO);

        assert!(voucher.matches_delivery_country(None));

        voucher.countries = vec!["DE".to_string()];

        assert!(!voucher.matches_delivery_country(None));
        assert!(!voucher.matches_delivery_country(Some("GB")));
        assert!(voucher.matches_delivery_country(Some("de")));
    }

    #[test]
    fn percentage_rounds_up_to_the_cent() {
        let voucher = voucher(DiscountType::Percentage, dec!(15));
        let discount = voucher.discount_amount(Money::new(dec!(9.99)), Money::ZERO, None, true);

        // 15% of 9.99 = 1.4985
        assert_eq!(discount, Money::new(dec!(1.50)));
    }

    #[test]
    fn fixed_price_is_capped_at_discountable_total() {
        let voucher = voucher(DiscountType::FixedPrice, dec!(15));

        assert_eq!(
            voucher.discount_amount(Money::new(dec!(50)), Money::ZERO, None, true),
            Money::new(dec!(15))
        );
        assert_eq!(
            voucher.discount_amount(Money::new(dec!(10)), Money::ZERO, None, true),
            Money::new(dec!(10))
        );
    }

    #[test]
    fn free_delivery_honours_flag_and_country() {
        let mut voucher = voucher(DiscountType::FreeDelivery, Decimal::ZERO);
        voucher.countries = vec!["DE".to_string()];
        let delivery = Money::new(dec!(9));

        assert_eq!(
            voucher.discount_amount(Money::new(dec!(50)), delivery, Some("DE"), true),
            delivery
        );
        assert_eq!(
            voucher.discount_amount(Money::new(dec!(50)), delivery, Some("DE"), false),
            Money::ZERO
        );
        assert_eq!(
            voucher.discount_amount(Money::new(dec!(50)), delivery, Some("GB"), true),
            Money::ZERO
        );
    }
}
