//! Non-negative quantity value type with checked arithmetic.

use serde::{Deserialize, Serialize};

use artisania_core::ValueObject;

use crate::error::{StockError, StockResult};

/// A non-negative number of stock units.
///
/// Arithmetic is checked, never clamped: an operation that would go negative
/// (or overflow) is rejected, forcing call sites to check availability before
/// mutating.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn add(self, other: Quantity) -> StockResult<Quantity> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(StockError::QuantityOverflow)
    }

    pub fn subtract(self, other: Quantity) -> StockResult<Quantity> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(StockError::NegativeQuantity)
    }

    pub fn less_than(self, other: Quantity) -> bool {
        self.0 < other.0
    }

    pub fn less_than_or_equal(self, other: Quantity) -> bool {
        self.0 <= other.0
    }

    pub fn greater_than_or_equal(self, other: Quantity) -> bool {
        self.0 >= other.0
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
