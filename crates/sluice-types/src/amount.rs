use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOKEN_DECIMALS: u32 = 18;
pub const BASE_UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000; // 10^18

/// A quantity of a network's native asset, held in the smallest on-chain
/// unit so arithmetic never loses precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Convert a display-unit quantity (e.g. `0.05` from configuration) to
    /// base units. Returns `None` when the value is not representable:
    /// negative, non-finite, or beyond u128 range.
    pub fn from_display(tokens: f64) -> Option<Self> {
        if !tokens.is_finite() || tokens < 0.0 {
            return None;
        }
        let units = tokens * BASE_UNITS_PER_TOKEN as f64;
        if units >= u128::MAX as f64 {
            return None;
        }
        Some(Self(units as u128))
    }

    pub fn to_base_units(&self) -> u128 {
        self.0
    }

    pub fn to_display(&self) -> f64 {
        self.0 as f64 / BASE_UNITS_PER_TOKEN as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BASE_UNITS_PER_TOKEN;
        let frac = self.0 % BASE_UNITS_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
