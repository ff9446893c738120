//! Fixed-point money.
//!
//! Amounts are exact decimals (`rust_decimal::Decimal`). Intermediate sums keep
//! full precision; rounding to cents happens only when a value is rendered.
//! Accepted amounts are capped at [`MAX_MONEY_CENTS`] so that `u32` unit counts
//! and row sums stay far inside `Decimal` range.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DomainError;

/// Number of fraction digits stored and rendered for money.
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude, in cents, accepted for an input amount (one trillion).
pub const MAX_MONEY_CENTS: i64 = 100_000_000_000_000;

/// An exact monetary amount (single implicit currency).
///
/// Serializes as a string with exactly two fraction digits (`"9.90"`).
/// Deserializes from either a JSON string or a JSON number.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Amount from an integer count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// `true` when the amount carries no more than two significant fraction digits.
    pub fn fits_cents(&self) -> bool {
        self.0.normalize().scale() <= MONEY_SCALE
    }

    /// `true` when the magnitude does not exceed [`MAX_MONEY_CENTS`].
    pub fn within_limit(&self) -> bool {
        self.0.abs() <= Decimal::new(MAX_MONEY_CENTS, MONEY_SCALE)
    }

    /// Why this amount cannot be accepted as an input, if it cannot.
    pub fn input_problem(&self) -> Option<&'static str> {
        if !self.fits_cents() {
            Some("at most 2 decimal places")
        } else if !self.within_limit() {
            Some("exceeds the maximum amount")
        } else {
            None
        }
    }

    /// Exact product `units × self`.
    pub fn times(&self, units: u32) -> Money {
        Money(self.0 * Decimal::from(units))
    }

    /// Exact quotient, rounded to cents. `None` when `divisor` is zero.
    pub fn per(&self, divisor: u64) -> Option<Money> {
        if divisor == 0 {
            return None;
        }
        Some(Money(self.0 / Decimal::from(divisor)).rounded())
    }

    /// Rounded to cents, half away from zero.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Presentation form: exactly two fraction digits.
    pub fn to_cents_string(&self) -> String {
        format!("{:.2}", self.rounded().0)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_cents_string())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_cents_string())
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|e| DomainError::validation("amount", format!("'{s}' is not a decimal: {e}")))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
