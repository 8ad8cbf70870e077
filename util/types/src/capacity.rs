//! Capacity units.

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The capacity of a cell, in shannons.
///
/// One byte of cell occupation costs 10^8 shannons, so capacity doubles as
/// a measurement of how much state a cell may store.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Capacity(u64);

/// Shannons per byte of cell occupation.
const BYTE_SHANNONS: u64 = 100_000_000;

/// Errors from checked capacity arithmetic.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
pub enum Error {
    /// Addition, subtraction or scaling left the u64 range.
    #[error("capacity arithmetic overflow")]
    Overflow,
}

/// Alias for capacity arithmetic results.
pub type Result<T> = std::result::Result<T, Error>;

impl Capacity {
    /// Zero shannons.
    pub const fn zero() -> Self {
        Capacity(0)
    }

    /// Constructs a capacity directly from shannons.
    pub const fn shannons(val: u64) -> Self {
        Capacity(val)
    }

    /// The cost of occupying `val` bytes of cell space.
    pub fn bytes(val: usize) -> Result<Self> {
        (val as u64)
            .checked_mul(BYTE_SHANNONS)
            .map(Capacity::shannons)
            .ok_or(Error::Overflow)
    }

    /// Returns the raw shannon count.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checked addition.
    pub fn safe_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Capacity::shannons)
            .ok_or(Error::Overflow)
    }

    /// Checked subtraction.
    pub fn safe_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Capacity::shannons)
            .ok_or(Error::Overflow)
    }

    /// True when the capacity is zero shannons.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
