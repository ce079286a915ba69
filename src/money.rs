//! Money
//!
//! Fixed-point amounts backed by [`Decimal`]. Amounts are persisted as integer minor units
//! (pence/cents) so stored baskets never carry floating point values.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::iso::Currency;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places kept for currency amounts.
const CENT_PLACES: u32 = 2;

/// A monetary amount in major units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount from a decimal in major units.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates an amount from integer minor units.
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, CENT_PLACES))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Converts to integer minor units, rounding half away from zero at the cent.
    ///
    /// Amounts that do not fit in an `i64` saturate.
    #[must_use]
    pub fn to_minor(self) -> i64 {
        let scaled = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero));

        match scaled.and_then(|value| value.to_i64()) {
            Some(minor) => minor,
            None if self.0.is_sign_negative() => i64::MIN,
            None => i64::MAX,
        }
    }

    /// Rounds up (away from zero) to the next whole cent.
    #[must_use]
    pub fn round_up_cent(self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(CENT_PLACES, RoundingStrategy::AwayFromZero),
        )
    }

    /// Multiplies a per-unit amount by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Money(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Applies a percentage to this amount, e.g. `40` percent of `50.00` is `20.00`.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        let fraction = Percentage::from(percent / Decimal::ONE_HUNDRED);

        Money(fraction * self.0)
    }

    /// Returns the smaller amount.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    /// Returns the larger amount.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    /// Clamps negative amounts to zero.
    #[must_use]
    pub fn non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Subtraction floored at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        (self - other).non_negative()
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Formats the amount with the given currency's symbol and separators.
    #[must_use]
    pub fn format(self, currency: &Currency) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointAwayFromZero);

        rusty_money::Money::from_decimal(rounded, currency).to_string()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<i64> for Money {
    fn from(major: i64) -> Self {
        Money(Decimal::from(major))
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64(value)
            .map(|amount| Money(amount.round_dp(CENT_PLACES)))
            .ok_or(MoneyConversionError(value))
    }
}

/// A floating point value that cannot be represented as money.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{0} is not a representable amount")]
pub struct MoneyConversionError(pub f64);

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.checked_sub(rhs.0).unwrap_or(Decimal::MIN))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}",
            self.0
                .round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointAwayFromZero)
        )
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_minor())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Money::from_minor)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn minor_units_round_trip() {
        let money = Money::from_minor(5_099);

        assert_eq!(money.amount(), dec!(50.99));
        assert_eq!(money.to_minor(), 5_099);
    }

    #[test]
    fn to_minor_rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).to_minor(), 13);
        assert_eq!(Money::new(dec!(0.124)).to_minor(), 12);
    }

    #[test]
    fn round_up_cent_always_rounds_up() {
        assert_eq!(Money::new(dec!(3.331)).round_up_cent(), Money::new(dec!(3.34)));
        assert_eq!(Money::new(dec!(3.33)).round_up_cent(), Money::new(dec!(3.33)));
    }

    #[test]
    fn percent_of_amount() {
        let money = Money::new(dec!(50.00));

        assert_eq!(money.percent(dec!(40)), Money::new(dec!(20.00)));
    }

    #[test]
    fn times_multiplies_by_quantity() {
        assert_eq!(Money::new(dec!(3.50)).times(3), Money::new(dec!(10.50)));
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let small = Money::new(dec!(5));
        let large = Money::new(dec!(7));

        assert_eq!(small.saturating_sub(large), Money::ZERO);
        assert_eq!(large.saturating_sub(small), Money::new(dec!(2)));
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [dec!(1.10), dec!(2.20), dec!(3.30)]
            .into_iter()
            .map(Money::new)
            .sum();

        assert_eq!(total, Money::new(dec!(6.60)));
    }

    #[test]
    fn serialises_as_minor_units() -> TestResult {
        let json = serde_json::to_string(&Money::new(dec!(57.00)))?;

        assert_eq!(json, "5700");
        assert_eq!(serde_json::from_str::<Money>("5700")?, Money::new(dec!(57.00)));

        Ok(())
    }

    #[test]
    fn formats_with_currency_symbol() {
        assert_eq!(Money::new(dec!(57)).format(GBP), "£57.00");
    }

    #[test]
    fn display_has_two_places() {
        assert_eq!(Money::from(7).to_string(), "7.00");
    }

    #[test]
    fn non_finite_float_is_rejected() {
        assert!(Money::try_from(f64::NAN).is_err());
    }
}
