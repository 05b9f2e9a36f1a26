use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A monetary value in francs CFA.
///
/// The currency has no minor unit, so amounts are whole non-negative integers.
/// Arithmetic saturates instead of wrapping since accrued penalties are uncapped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(francs: u64) -> Self {
        Self(francs)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a per-day rate by a number of days.
    pub fn times(self, days: u64) -> Self {
        Self(self.0.saturating_mul(days))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::new(10_000);
        let b = Amount::new(11_000);
        assert_eq!(a + b, Amount::new(21_000));

        let mut c = a;
        c += b;
        assert_eq!(c, Amount::new(21_000));
    }

    #[test]
    fn test_amount_sum() {
        let total: Amount = [100_000, 500_000, 10_000]
            .into_iter()
            .map(Amount::new)
            .sum();
        assert_eq!(total, Amount::new(610_000));
    }

    #[test]
    fn test_amount_saturates() {
        assert_eq!(Amount::new(u64::MAX) + Amount::new(1), Amount::new(u64::MAX));
        assert_eq!(Amount::new(10_000).times(u64::MAX), Amount::new(u64::MAX));
        assert_eq!(Amount::new(500).times(5), Amount::new(2_500));
    }

    #[test]
    fn test_amount_serializes_as_integer() {
        let json = serde_json::to_string(&Amount::new(1_390_000)).unwrap();
        assert_eq!(json, "1390000");
    }
}
