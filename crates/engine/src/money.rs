use std::{fmt, iter::Sum};

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::EngineError;

/// Number of fraction digits carried by [`Money`].
pub const MINOR_UNITS: u32 = 2;

/// Signed money amount represented as **integer minor units** (cents).
///
/// Expense totals, share amounts and aggregates are all `Money`, so "the
/// shares add up to the total" is an exact integer comparison.
///
/// ```rust
/// use engine::Money;
/// use rust_decimal::Decimal;
///
/// let amount = Money::try_from(Decimal::new(1234, 2)).unwrap();
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Sums an iterator of amounts, returning `None` on overflow.
    pub fn checked_sum<I>(iter: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        iter.into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// The amount in major units (`1050` -> `10.50`).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNITS)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = EngineError;

    /// Converts a decimal in major units into minor units.
    ///
    /// Trailing zeros are ignored (`10.500` is fine), any other digit past the
    /// second decimal is rejected rather than rounded.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNITS {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }
        let minor = normalized
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|v| v.to_i64())
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        Ok(Money(minor))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(Money::minor).sum())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn display_formats_major_units() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn from_decimal() {
        assert_eq!(Money::try_from(dec!(3000)).unwrap(), Money::new(300_000));
        assert_eq!(Money::try_from(dec!(10.5)).unwrap(), Money::new(1050));
        assert_eq!(Money::try_from(dec!(10.500)).unwrap(), Money::new(1050));
        assert_eq!(
            Money::try_from(dec!(0.001)),
            Err(EngineError::InvalidAmount("too many decimals".to_string()))
        );
        assert!(Money::try_from(Decimal::MAX).is_err());
    }

    #[test]
    fn to_decimal_keeps_two_digits() {
        assert_eq!(Money::new(100_000).to_decimal().to_string(), "1000.00");
        assert_eq!(Money::new(-5).to_decimal(), dec!(-0.05));
    }

    #[test]
    fn checked_sum_detects_overflow() {
        assert_eq!(
            Money::checked_sum([Money::new(1), Money::new(2)]),
            Some(Money::new(3))
        );
        assert_eq!(Money::checked_sum([Money::new(i64::MAX), Money::new(1)]), None);
    }
}
