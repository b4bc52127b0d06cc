//! Stable-token amount type.
//!
//! Amounts are fixed-point integers (u128) in the token's smallest unit. The
//! reference token uses 18 decimals, so one whole token is [`TOKEN_UNIT`] raw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Raw units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// An amount of the stable token, in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole tokens, scaled by [`TOKEN_UNIT`].
    pub fn from_tokens(units: u128) -> Self {
        Self(units.saturating_mul(TOKEN_UNIT))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Whole tokens, truncating any fractional part.
    pub fn to_tokens(&self) -> u128 {
        self.0 / TOKEN_UNIT
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Integer division into `parts` equal shares. `None` when `parts` is zero.
    pub fn checked_div(self, parts: u32) -> Option<Self> {
        self.0.checked_div(u128::from(parts)).map(Self)
    }
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
