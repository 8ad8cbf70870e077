//! Transaction fee rate.

use crate::capacity::Capacity;
use serde_derive::{Deserialize, Serialize};

/// shannons per kilobyte
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeeRate(u64);

impl FeeRate {
    /// Creates a fee rate from shannons per 1000 bytes.
    pub const fn from_u64(fee_per_kb: u64) -> Self {
        FeeRate(fee_per_kb)
    }

    /// A zero fee rate.
    pub const fn zero() -> Self {
        Self::from_u64(0)
    }

    /// Returns the raw shannons-per-kilobyte value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The minimum fee for a transaction of `size` serialized bytes,
    /// rounded up so an unsigned build never underpays after signing.
    pub fn fee(self, size: usize) -> Capacity {
        let base = self.0.saturating_mul(size as u64);
        let fee = base / 1000;
        if fee.saturating_mul(1000) < base {
            Capacity::shannons(fee + 1)
        } else {
            Capacity::shannons(fee)
        }
    }
}

impl ::std::fmt::Display for FeeRate {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
