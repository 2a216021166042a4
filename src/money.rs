//! Fixed-point money representation.
//!
//! Cash, fees, taxes and transaction totals are represented as whole cents (`i64`) rather than
//! floating point, per the engine's money-representation design note. Prices and per-share
//! quantities remain `f64` (or [`rust_decimal::Decimal`] where curve/ratio math benefits from
//! exact decimal arithmetic) since fractional shares are not modelled.

use derive_more::{Add, AddAssign, Constructor, Display, Neg, Sub, SubAssign};
use serde::{Deserialize, Serialize};
use std::iter::Sum;

/// An amount of money, stored as whole cents.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Neg,
    Constructor,
    Deserialize,
    Serialize,
    Display,
)]
#[display("${}.{:02}", self.whole(), self.cents_remainder())]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Construct from a floating-point dollar amount, rounding to the nearest cent.
    pub fn from_dollars_f64(dollars: f64) -> Self {
        Self((dollars * 100.0).round() as i64)
    }

    pub fn as_cents(&self) -> i64 {
        self.0
    }

    pub fn as_dollars_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    fn whole(&self) -> i64 {
        self.0 / 100
    }

    fn cents_remainder(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Multiply by a floating point scalar (e.g. a tax or fee rate), rounding to the nearest cent.
    pub fn scale(&self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }

    /// Allocate this amount across `shares` units, rounding each unit down and depositing the
    /// remainder on the first unit so the sum is exactly conserved.
    pub fn checked_div_shares(&self, shares: u64) -> Self {
        if shares == 0 {
            return *self;
        }
        Self(self.0 / shares as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_dollars_and_cents() {
        assert_eq!(Money::cents(12345).to_string(), "$123.45");
        assert_eq!(Money::cents(5).to_string(), "$0.05");
    }

    #[test]
    fn from_dollars_rounds_to_nearest_cent() {
        assert_eq!(Money::from_dollars_f64(10.005), Money::cents(1001));
        assert_eq!(Money::from_dollars_f64(9.999), Money::cents(1000));
    }

    #[test]
    fn conserves_sum_across_arithmetic() {
        let a = Money::cents(1000);
        let b = Money::cents(-400);
        assert_eq!(a + b, Money::cents(600));
        assert_eq!(-a, Money::cents(-1000));
    }
}
