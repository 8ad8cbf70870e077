//! The `since` field of an input: an encoded minimum-age constraint the
//! chain enforces before the input may be spent.
//!
//! Layout (RFC 0017): bit 63 is the relative flag, bits 61..=62 select the
//! metric (block number, epoch, timestamp) and the low 56 bits carry the
//! metric value.

/// Bit flag marking a since value as relative to the input's inclusion.
pub const LOCK_TYPE_FLAG: u64 = 1 << 63;
/// Mask of the two metric-flag bits.
pub const METRIC_TYPE_FLAG_MASK: u64 = 0x6000_0000_0000_0000;
/// Metric flag for epoch-number-with-fraction values.
pub const METRIC_EPOCH_FLAG: u64 = 0x2000_0000_0000_0000;
/// Mask of the 56-bit metric value.
pub const VALUE_MASK: u64 = 0x00ff_ffff_ffff_ffff;

/// An epoch number plus a fraction, packed into 56 bits:
/// number in the low 24 bits, index in the next 16, length in the next 16.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochNumberWithFraction(u64);

impl EpochNumberWithFraction {
    const NUMBER_OFFSET: usize = 0;
    const NUMBER_MASK: u64 = 0xff_ffff;
    const INDEX_OFFSET: usize = 24;
    const INDEX_MASK: u64 = 0xffff;
    const LENGTH_OFFSET: usize = 40;
    const LENGTH_MASK: u64 = 0xffff;

    /// Packs `number + index/length` epochs.
    pub const fn new(number: u64, index: u64, length: u64) -> Self {
        EpochNumberWithFraction(
            ((length & Self::LENGTH_MASK) << Self::LENGTH_OFFSET)
                | ((index & Self::INDEX_MASK) << Self::INDEX_OFFSET)
                | ((number & Self::NUMBER_MASK) << Self::NUMBER_OFFSET),
        )
    }

    /// The whole-epoch part.
    pub const fn number(self) -> u64 {
        (self.0 >> Self::NUMBER_OFFSET) & Self::NUMBER_MASK
    }

    /// The fraction numerator.
    pub const fn index(self) -> u64 {
        (self.0 >> Self::INDEX_OFFSET) & Self::INDEX_MASK
    }

    /// The fraction denominator; zero means "no fraction".
    pub const fn length(self) -> u64 {
        (self.0 >> Self::LENGTH_OFFSET) & Self::LENGTH_MASK
    }

    /// The packed 56-bit representation.
    pub const fn full_value(self) -> u64 {
        self.0
    }
}

/// An encoded since constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Since(pub u64);

impl Since {
    /// A constraint requiring `epoch` to elapse after the input's own
    /// inclusion before it may be consumed.
    pub const fn relative_epoch(epoch: EpochNumberWithFraction) -> Self {
        Since(LOCK_TYPE_FLAG | METRIC_EPOCH_FLAG | epoch.full_value())
    }

    /// Whether the constraint counts from the input's inclusion rather than
    /// from genesis.
    pub const fn is_relative(self) -> bool {
        self.0 & LOCK_TYPE_FLAG != 0
    }

    /// Whether the metric is an epoch number with fraction.
    pub const fn is_epoch_based(self) -> bool {
        self.0 & METRIC_TYPE_FLAG_MASK == METRIC_EPOCH_FLAG
    }

    /// The raw 56-bit metric value.
    pub const fn value(self) -> u64 {
        self.0 & VALUE_MASK
    }

    /// The full encoded field as it appears in a `CellInput`.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_six_epochs_encoding() {
        let since = Since::relative_epoch(EpochNumberWithFraction::new(6, 0, 0));
        assert_eq!(since.as_u64(), 0xa000_0000_0000_0006);
        assert!(since.is_relative());
        assert!(since.is_epoch_based());
        assert_eq!(since.value(), 6);
    }

    #[test]
    fn epoch_fields_round_trip() {
        let epoch = EpochNumberWithFraction::new(0x1234, 0x56, 0x9abc);
        assert_eq!(epoch.number(), 0x1234);
        assert_eq!(epoch.index(), 0x56);
        assert_eq!(epoch.length(), 0x9abc);
    }
}
