//! Money value object.

use serde::{Deserialize, Serialize};

/// Money amount held in minor units (cents) to avoid floating point drift.
///
/// Amounts cross the HTTP boundary as decimal numbers of major units;
/// [`Money::from_decimal`] and [`Money::as_decimal`] do that conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates an amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates an amount from whole major units, saturating at the `i64`
    /// range. Use [`Money::checked_from_major`] for untrusted input.
    pub fn from_major(units: i64) -> Self {
        Self {
            cents: units.saturating_mul(100),
        }
    }

    /// Creates an amount from whole major units, or `None` when the cents
    /// do not fit in an `i64`.
    pub fn checked_from_major(units: i64) -> Option<Self> {
        units.checked_mul(100).map(Self::from_cents)
    }

    /// Creates an amount from a decimal number of major units, rounding
    /// to the nearest cent. Returns `None` for non-finite amounts and for
    /// amounts whose cents do not fit in an `i64`.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        // `i64::MAX as f64` rounds up to 2^63, hence the strict bound.
        if !cents.is_finite() || cents < i64::MIN as f64 || cents >= i64::MAX as f64 {
            return None;
        }
        Some(Self {
            cents: cents as i64,
        })
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole major units.
    pub fn major_units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents remainder after the major units.
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns the amount as a decimal number of major units.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.cents.checked_add(rhs.cents).map(Self::from_cents)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.major_units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.major_units(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major() {
        let m = Money::from_major(106000);
        assert_eq!(m.cents(), 10_600_000);
        assert_eq!(m.major_units(), 106000);
    }

    #[test]
    fn test_from_decimal_rounds_to_nearest_cent() {
        assert_eq!(Money::from_decimal(19.99).unwrap().cents(), 1999);
        assert_eq!(Money::from_decimal(0.1 + 0.2).unwrap().cents(), 30);
        assert_eq!(Money::from_decimal(-1.5).unwrap().cents(), -150);
    }

    #[test]
    fn test_from_decimal_rejects_unrepresentable_amounts() {
        assert_eq!(Money::from_decimal(1e17), None);
        assert_eq!(Money::from_decimal(-1e17), None);
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
        assert_eq!(Money::from_decimal(f64::NAN), None);
        assert!(Money::from_decimal(1e15).is_some());
    }

    #[test]
    fn test_major_units_overflow() {
        assert_eq!(Money::checked_from_major(i64::MAX / 10), None);
        assert_eq!(
            Money::checked_from_major(5000),
            Some(Money::from_major(5000))
        );
        assert_eq!(Money::from_major(i64::MAX).cents(), i64::MAX);
    }

    #[test]
    fn test_checked_add() {
        let fee = Money::from_major(1000);
        assert_eq!(fee.checked_add(fee), Some(Money::from_major(2000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(fee), None);
    }

    #[test]
    fn test_as_decimal() {
        assert_eq!(Money::from_cents(29_900_000).as_decimal(), 299000.0);
        assert_eq!(Money::from_cents(1050).as_decimal(), 10.5);
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(-1).is_negative());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let total: Money = [
            Money::from_major(100000),
            Money::from_major(1000),
            Money::from_major(5000),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, Money::from_major(106000));
        assert_eq!(total - Money::from_major(6000), Money::from_major(100000));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }
}
