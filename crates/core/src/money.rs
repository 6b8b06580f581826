//! Money in minor currency units (paise, cents).
//!
//! All amounts are integers. Percentages are expressed in basis points
//! (1800 = 18.00%) so tax math never touches floating point.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

/// Amount in the smallest currency unit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `self × quantity`, rejecting results outside the `i64` range.
    pub fn times(&self, quantity: i64) -> DomainResult<Money> {
        self.0.checked_mul(quantity).map(Money).ok_or_else(out_of_range)
    }

    pub fn checked_add(&self, rhs: Money) -> DomainResult<Money> {
        self.0.checked_add(rhs.0).map(Money).ok_or_else(out_of_range)
    }

    /// Sum that fails instead of wrapping. Use on amounts taken from requests.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> DomainResult<Money> {
        amounts.into_iter().try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// `self × bps / 10000`, rounded half away from zero.
    ///
    /// 18% of 999 paise is 179.82 → 180.
    pub fn percent_bps(&self, bps: i64) -> Money {
        let raw = self.0 as i128 * bps as i128;
        let scale = BPS_SCALE as i128;
        let half = scale / 2;
        let rounded = if raw >= 0 {
            (raw + half) / scale
        } else {
            (raw - half) / scale
        };
        Money(rounded as i64)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

fn out_of_range() -> DomainError {
    DomainError::validation("amount out of range")
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(Money::from_minor(999).percent_bps(1800), Money::from_minor(180));
        assert_eq!(Money::from_minor(1000).percent_bps(825), Money::from_minor(83));
        assert_eq!(Money::from_minor(-1000).percent_bps(825), Money::from_minor(-83));
        assert_eq!(Money::from_minor(50).percent_bps(100), Money::from_minor(1));
    }

    #[test]
    fn serializes_as_bare_minor_units() {
        assert_eq!(serde_json::to_string(&Money::from_minor(-1250)).unwrap(), "-1250");
        assert_eq!(serde_json::from_str::<Money>("1800").unwrap(), Money::from_minor(1800));
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_minor(123456).to_string(), "1234.56");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [100, 250, -50].into_iter().map(Money::from_minor).sum();
        assert_eq!(total, Money::from_minor(300));
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        let huge = Money::from_minor(1_000_000_000_000);
        assert!(matches!(huge.times(1_000_000_000_000), Err(DomainError::Validation(_))));
        assert!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)).is_err());
        assert!(Money::checked_sum([Money::from_minor(i64::MAX), Money::from_minor(1)]).is_err());
        assert_eq!(huge.times(3).unwrap(), Money::from_minor(3_000_000_000_000));
    }

    proptest! {
        /// Full rate returns the amount itself; zero rate returns nothing.
        #[test]
        fn percent_bounds(amount in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_minor(amount);
            prop_assert_eq!(m.percent_bps(BPS_SCALE), m);
            prop_assert_eq!(m.percent_bps(0), Money::ZERO);
        }
    }
}
