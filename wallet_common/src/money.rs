use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of minor units in one major unit. Amounts carry exactly two fractional digits.
pub const MINOR_UNITS: i64 = 100;

//--------------------------------------        Money         ---------------------------------------------------------
/// A signed fixed-point amount, stored as a whole number of hundredths.
///
/// Ledger entries use the sign to encode direction (credits positive, debits negative), so `Money` is deliberately
/// signed. All arithmetic is integer arithmetic; there is no floating point anywhere on the money path.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from_minor(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let minor = MINOR_UNITS.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / minor, abs % minor)
    }
}

/// Parses decimal strings such as `"12"`, `"12.5"` or `"-0.75"`. At most two fractional digits are accepted.
impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoneyConversionError(format!("'{s}' is not a valid amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        let value = whole.checked_mul(MINOR_UNITS).and_then(|v| v.checked_add(frac)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Money {
    /// The raw value in minor units (hundredths).
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn from_major(major: i64) -> Self {
        Self(major * MINOR_UNITS)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_minor(10_000).to_string(), "100.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-1205).to_string(), "-12.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("12".parse::<Money>().unwrap(), Money::from_major(12));
        assert_eq!("12.3".parse::<Money>().unwrap(), Money::from_minor(1230));
        assert_eq!("12.34".parse::<Money>().unwrap(), Money::from_minor(1234));
        assert_eq!(" .5 ".parse::<Money>().unwrap(), Money::from_minor(50));
        assert_eq!("-0.75".parse::<Money>().unwrap(), Money::from_minor(-75));
    }

    #[test]
    fn parse_rejects_garbage() {
        for s in ["", ".", "abc", "1.234", "1,00", "1.2.3", "--1", "99999999999999999999"] {
            assert!(s.parse::<Money>().is_err(), "'{s}' should not parse");
        }
    }

    #[test]
    fn arithmetic_has_no_drift() {
        let tenth = Money::from_minor(10);
        let total: Money = std::iter::repeat(tenth).take(10).sum();
        assert_eq!(total, Money::from_major(1));
        let mut m = Money::from_major(3);
        m -= Money::from_minor(1);
        assert_eq!(m.to_string(), "2.99");
        assert_eq!(-m, Money::from_minor(-299));
        assert_eq!(Money::from_minor(250) * 3, Money::from_minor(750));
    }

    #[test]
    fn serializes_as_minor_units() {
        let json = serde_json::to_string(&Money::from_minor(1234)).unwrap();
        assert_eq!(json, "1234");
    }
}
