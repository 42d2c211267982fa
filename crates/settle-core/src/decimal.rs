//! Exact decimal quote types.
//!
//! Venue prices are compared and differenced as `rust_decimal::Decimal`;
//! `Price` and `Size` keep the two roles apart at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quoted price of one unit of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Strictly above zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Distance between two prices. Cannot overflow for non-negative prices.
    #[inline]
    pub fn abs_diff(&self, other: Price) -> Price {
        Self((self.0 - other.0).abs())
    }

    /// Gap between two prices as a percentage of the lower one.
    ///
    /// `None` when the lower price is not positive or the result does not fit
    /// a `Decimal`.
    pub fn gap_pct(&self, other: Price) -> Option<Decimal> {
        let low = (*self).min(other);
        if !low.is_positive() {
            return None;
        }
        self.abs_diff(other)
            .0
            .checked_div(low.0)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

/// Traded quantity in asset units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Total value of this size at `per_unit` (a price or a price gap).
    ///
    /// `None` on overflow.
    #[inline]
    pub fn value_at(&self, per_unit: Decimal) -> Option<Decimal> {
        self.0.checked_mul(per_unit)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}
