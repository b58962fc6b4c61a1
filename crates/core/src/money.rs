use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A monetary amount stored as integer cents.
///
/// Bank files carry decimal text; the storage layer carries `i64` cents.
/// `Money` is the conversion point between the two, rounding to two
/// decimal places on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn to_cents(self) -> i64 {
        self.0
    }

    pub fn from_decimal(decimal: Decimal) -> Option<Self> {
        (decimal.round_dp(2) * Decimal::from(100)).to_i64().map(Money)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(100)
    }

    pub fn zero() -> Self {
        Money(0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Absolute difference in cents between two amounts.
    pub fn diff_cents(self, other: Money) -> i64 {
        (self.0 - other.0).abs()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}
