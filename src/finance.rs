//! Finance
//!
//! Which loan/finance options a basket qualifies for.

use crate::{catalogue::products::ProductId, ids::TypedId, money::Money};

/// Finance option id
pub type FinanceOptionId = TypedId<FinanceOption>;

/// A finance (loan) product offered at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceOption {
    /// Option id
    pub id: FinanceOptionId,

    /// Display title
    pub title: String,

    /// Disabled options are never offered.
    pub enabled: bool,

    /// Sort order
    pub seq: i32,

    /// Minimum basket total required.
    pub min_basket_value: Money,

    /// Only offered when a product listing this option is in the basket.
    pub per_product: bool,
}

/// What finance eligibility needs to know about a basket line.
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceLine {
    /// Product on the line
    pub product_id: ProductId,

    /// Product forbids finance
    pub loan_exempt: bool,

    /// Product is a pre-order
    pub pre_order: bool,

    /// Per-unit deposit
    pub deposit: Money,

    /// Per-product finance options listed by the product
    pub finance_options: Vec<FinanceOptionId>,
}

/// Basket snapshot evaluated for finance.
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceBasket<'a> {
    /// Finance switched on for the shop
    pub enabled: bool,

    /// Basket is frozen
    pub frozen: bool,

    /// Basket total
    pub total: Money,

    /// Basket lines
    pub lines: &'a [FinanceLine],
}

/// Filters applied by [`options_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinanceFilter {
    /// Drop options whose minimum exceeds the basket total.
    pub consider_minimum: bool,

    /// Offer nothing when a line is loan exempt or a pre-order with a deposit.
    pub consider_exempt: bool,
}

impl Default for FinanceFilter {
    fn default() -> Self {
        FinanceFilter {
            consider_minimum: true,
            consider_exempt: true,
        }
    }
}

/// Finance options the basket qualifies for, ordered by sequence.
pub fn options_for<'o>(
    options: &'o [FinanceOption],
    basket: &FinanceBasket<'_>,
    filter: FinanceFilter,
) -> Vec<&'o FinanceOption> {
    if !basket.enabled || basket.frozen || basket.lines.is_empty() {
        return Vec::new();
    }

    if filter.consider_exempt
        && basket
            .lines
            .iter()
            .any(|line| line.loan_exempt || (line.pre_order && line.deposit.is_positive()))
    {
        return Vec::new();
    }

    let mut eligible: Vec<&FinanceOption> = options
        .iter()
        .filter(|option| option.enabled)
        .filter(|option| !filter.consider_minimum || option.min_basket_value <= basket.total)
        .filter(|option| {
            !option.per_product
                || basket
                    .lines
                    .iter()
                    .any(|line| line.finance_options.contains(&option.id))
        })
        .collect();

    eligible.sort_by_key(|option| option.seq);
    eligible
}

/// The smallest basket total at which any option would be offered.
pub fn loan_threshold(options: &[FinanceOption], basket: &FinanceBasket<'_>) -> Option<Money> {
    let filter = FinanceFilter {
        consider_minimum: false,
        consider_exempt: true,
    };

    options_for(options, basket, filter)
        .into_iter()
        .map(|option| option.min_basket_value)
        .min()
}

/// How much more the customer has to spend before finance is offered.
pub fn remaining_loan_total(options: &[FinanceOption], basket: &FinanceBasket<'_>) -> Money {
    loan_threshold(options, basket)
        .map_or(Money::ZERO, |threshold| threshold.saturating_sub(basket.total))
}
